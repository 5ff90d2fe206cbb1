//! The Commodore 64: the top-level scheduler that owns every component and
//! ticks them in a fixed per-cycle order (VIC, CIA1, CIA2, CPU, expansion
//! port, IEC, 1541s). One struct owns every chip and implements `Bus`
//! against itself via a raw-pointer reborrow, since Rust's borrow checker
//! cannot otherwise express "the CPU's bus is the struct the CPU is a
//! field of."

pub mod cartridge;
pub mod cia;
pub mod crt;
pub mod drive1541;
pub mod expansion_port;
pub mod iec;
pub mod memory;
pub mod sid;
pub mod snapshot;
pub mod vic;

use crate::core::bus::InterruptState;
use crate::core::machine::{InputButton, Machine};
use crate::core::{Bus, BusMaster};
use crate::cpu::m6510::M6510;
use crate::cpu::Cpu;

use cartridge::Cartridge;
use cia::Cia;
use crt::{CrtError, ParsedCrt};
use drive1541::Drive1541;
use expansion_port::ExpansionPort;
use iec::{IecBus, IecContribution};
use memory::{Memory, MemoryRegion};
use sid::SidRegisters;
use snapshot::{SnapshotError, SnapshotReader, SnapshotWriter};
use vic::{Vic, VicBus};

pub use vic::TvStandard;

pub const NUM_DRIVES: usize = 2;

/// The processor port's bits 3-5 (cassette motor/write/sense), kept as
/// observable core state. No TAP parsing or pulse synthesis lives here —
/// an external collaborator supplies pulse timing.
#[derive(Default)]
pub struct Datasette {
    pub motor_on: bool,
    pub sense: bool,
    pulse_counter: u32,
}

/// Non-blocking events the core raises for the host to observe, drained with
/// `C64::take_messages`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostMessage {
    RomsMissing,
    CartridgeAttached,
    CartridgeDetached,
    DiskInserted(usize),
    DiskEjected(usize),
    DiskModified(usize),
    IecBusIdle,
    IecBusBusy,
    CpuJammed,
    BreakpointHit(u16),
    WatchpointHit(u16),
    RasterIrq,
    FrameComplete,
}

/// Joystick bits, active low (cleared bit = pressed), matching the CIA port
/// wiring: bit0 up, bit1 down, bit2 left, bit3 right, bit4 fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoystickState(pub u8);

impl Default for JoystickState {
    fn default() -> Self {
        JoystickState(0x1F)
    }
}

pub struct C64 {
    pub cpu: M6510,
    pub memory: Memory,
    pub vic: Vic,
    pub cia1: Cia,
    pub cia2: Cia,
    pub expansion_port: ExpansionPort,
    pub iec: IecBus,
    pub drives: [Drive1541; NUM_DRIVES],
    pub sid: SidRegisters,
    pub datasette: Datasette,

    keyboard: [[bool; 8]; 8],
    joystick1: JoystickState,
    joystick2: JoystickState,

    clock: u64,
    prev_nmi_line: bool,

    breakpoints: Vec<u16>,
    watchpoints: Vec<u16>,
    jammed: bool,
    messages: Vec<HostMessage>,

    roms_loaded: bool,
}

impl C64 {
    pub fn new(standard: TvStandard, drive_rom: [u8; 0x4000]) -> Self {
        Self {
            cpu: M6510::new(),
            memory: Memory::new(),
            vic: Vic::new(standard),
            cia1: Cia::new(),
            cia2: Cia::new(),
            expansion_port: ExpansionPort::new(),
            iec: IecBus::new(),
            drives: [Drive1541::new(drive_rom), Drive1541::new(drive_rom)],
            sid: SidRegisters::new(),
            datasette: Datasette::default(),
            keyboard: [[false; 8]; 8],
            joystick1: JoystickState::default(),
            joystick2: JoystickState::default(),
            clock: 0,
            prev_nmi_line: false,
            breakpoints: Vec::new(),
            watchpoints: Vec::new(),
            jammed: false,
            messages: Vec::new(),
            roms_loaded: false,
        }
    }

    pub fn load_roms(&mut self, basic: [u8; 0x2000], kernal: [u8; 0x2000], chargen: [u8; 0x1000]) {
        *self.memory.basic_rom = basic;
        *self.memory.kernal_rom = kernal;
        *self.memory.char_rom = chargen;
        self.roms_loaded = true;
    }

    pub fn take_messages(&mut self) -> Vec<HostMessage> {
        std::mem::take(&mut self.messages)
    }

    pub fn add_breakpoint(&mut self, addr: u16) {
        if !self.breakpoints.contains(&addr) {
            self.breakpoints.push(addr);
        }
    }

    pub fn remove_breakpoint(&mut self, addr: u16) {
        self.breakpoints.retain(|&a| a != addr);
    }

    pub fn add_watchpoint(&mut self, addr: u16) {
        if !self.watchpoints.contains(&addr) {
            self.watchpoints.push(addr);
        }
    }

    pub fn is_jammed(&self) -> bool {
        self.jammed
    }

    pub fn cycle(&self) -> u64 {
        self.clock
    }

    /// Serializes every component's stateful fields, in the dependency
    /// order `SPEC_FULL.md` establishes (memory, CIAs/SID/CPU, VIC-II,
    /// cartridge/expansion port, IEC, 1541s), behind a magic+version
    /// header. Breakpoints/watchpoints, the pending `HostMessage` queue,
    /// the VIC's rendered texture, and the SID write log are host/debugger
    /// concerns rather than hardware state and are not included — see
    /// `snapshot.rs`'s module doc.
    pub fn save_snapshot(&self) -> Vec<u8> {
        let mut w = SnapshotWriter::new();
        snapshot::write_header(&mut w);

        self.memory.save_state(&mut w);
        self.cia1.save_state(&mut w);
        self.cia2.save_state(&mut w);
        self.sid.save_state(&mut w);
        self.cpu.save_state(&mut w);
        self.vic.save_state(&mut w);
        self.expansion_port.save_state(&mut w);
        self.iec.save_state(&mut w);
        for drive in &self.drives {
            drive.save_state(&mut w);
        }

        w.bool(self.datasette.motor_on);
        w.bool(self.datasette.sense);
        w.u32(self.datasette.pulse_counter);

        for row in &self.keyboard {
            for &key in row {
                w.bool(key);
            }
        }
        w.u8(self.joystick1.0);
        w.u8(self.joystick2.0);
        w.u64(self.clock);
        w.bool(self.prev_nmi_line);
        w.bool(self.jammed);
        w.bool(self.roms_loaded);

        w.into_bytes()
    }

    /// Restores state written by `save_snapshot`. On error the machine is
    /// left in a partially-overwritten state; the caller should treat any
    /// `Err` as fatal to the in-progress load and not resume ticking
    /// without either retrying with good data or resetting.
    pub fn load_snapshot(&mut self, bytes: &[u8]) -> Result<(), SnapshotError> {
        let mut r = SnapshotReader::new(bytes);
        snapshot::read_header(&mut r)?;

        self.memory.load_state(&mut r)?;
        self.cia1.load_state(&mut r)?;
        self.cia2.load_state(&mut r)?;
        self.sid.load_state(&mut r)?;
        self.cpu.load_state(&mut r)?;
        self.vic.load_state(&mut r)?;
        self.expansion_port.load_state(&mut r)?;
        self.iec.load_state(&mut r)?;
        for drive in &mut self.drives {
            drive.load_state(&mut r)?;
        }

        self.datasette.motor_on = r.bool()?;
        self.datasette.sense = r.bool()?;
        self.datasette.pulse_counter = r.u32()?;

        for row in &mut self.keyboard {
            for key in row.iter_mut() {
                *key = r.bool()?;
            }
        }
        self.joystick1 = JoystickState(r.u8()?);
        self.joystick2 = JoystickState(r.u8()?);
        self.clock = r.u64()?;
        self.prev_nmi_line = r.bool()?;
        self.jammed = r.bool()?;
        self.roms_loaded = r.bool()?;

        self.recompute_banking();
        Ok(())
    }

    // --- Keyboard / joystick input --------------------------------------

    pub fn set_key(&mut self, row: usize, col: usize, pressed: bool) {
        if row < 8 && col < 8 {
            self.keyboard[row][col] = pressed;
        }
    }

    pub fn set_joystick1(&mut self, state: JoystickState) {
        self.joystick1 = state;
    }

    pub fn set_joystick2(&mut self, state: JoystickState) {
        self.joystick2 = state;
    }

    /// Keyboard-matrix read as seen through CIA1: columns are driven by
    /// whichever port has the corresponding DDR bits set as outputs (almost
    /// always port A), rows read back through the other port.
    fn update_keyboard_and_joysticks(&mut self) {
        let columns = self.cia1.output_a();
        let mut rows = 0xFFu8;
        for (row, key_row) in self.keyboard.iter().enumerate() {
            let pulled = (0..8).any(|col| columns & (1 << col) == 0 && key_row[col]);
            if pulled {
                rows &= !(1 << row);
            }
        }
        rows &= self.joystick1.0 | 0xE0;
        self.cia1.set_port_b_input(rows);
        self.cia1.set_port_a_input(self.joystick2.0 | 0xE0);
    }

    // --- Cartridges / disks ----------------------------------------------

    pub fn attach_cartridge_from_crt(&mut self, bytes: &[u8]) -> Result<(), CrtError> {
        let parsed: ParsedCrt = crt::parse(bytes)?;
        let cart = crt::build_cartridge(&parsed);
        self.attach_cartridge(cart);
        Ok(())
    }

    pub fn attach_cartridge(&mut self, cart: Cartridge) {
        self.expansion_port.attach(cart);
        self.messages.push(HostMessage::CartridgeAttached);
        self.reset();
    }

    pub fn detach_cartridge(&mut self) {
        self.expansion_port.detach();
        self.messages.push(HostMessage::CartridgeDetached);
        self.reset();
    }

    pub fn insert_disk(&mut self, drive: usize, tracks: Vec<Vec<u8>>) {
        if drive < NUM_DRIVES {
            self.drives[drive].load_gcr_tracks(tracks);
            self.messages.push(HostMessage::DiskInserted(drive));
        }
    }

    pub fn eject_disk(&mut self, drive: usize) {
        if drive < NUM_DRIVES {
            self.drives[drive].eject();
            self.messages.push(HostMessage::DiskEjected(drive));
        }
    }

    // --- Memory dispatch ---------------------------------------------------

    fn processor_port_bits(&self) -> (bool, bool, bool) {
        let value = self.cpu.read_port(1, 0xFF);
        (value & 0x01 != 0, value & 0x02 != 0, value & 0x04 != 0)
    }

    fn recompute_banking(&mut self) {
        let (loram, hiram, charen) = self.processor_port_bits();
        self.memory.update_banking(
            loram,
            hiram,
            charen,
            self.expansion_port.game(),
            self.expansion_port.exrom(),
        );
    }

    fn peek(&mut self, addr: u16) -> u8 {
        if addr < 2 {
            return self.cpu.read_port(addr, 0xFF);
        }
        match self.memory.peek_src(addr) {
            MemoryRegion::Ram => self.memory.ram_read(addr),
            MemoryRegion::Basic => self.memory.basic_read(addr),
            MemoryRegion::Char => self.memory.char_read(addr),
            MemoryRegion::Kernal => self.memory.kernal_read(addr),
            MemoryRegion::CrtLow => self.expansion_port.peek_roml(addr, self.vic.last_data_bus()),
            MemoryRegion::CrtHigh => self.expansion_port.peek_romh(addr, self.vic.last_data_bus()),
            MemoryRegion::Io => self.peek_io(addr),
            MemoryRegion::Open => self.vic.last_data_bus(),
            MemoryRegion::ProcessorPort => unreachable!("addr < 2 handled above"),
        }
    }

    fn peek_io(&mut self, addr: u16) -> u8 {
        match addr {
            0xD000..=0xD3FF => self.vic.read_register(((addr - 0xD000) & 0x3F) as u8),
            0xD400..=0xD7FF => self.sid.read(((addr - 0xD400) & 0x1F) as u8),
            0xD800..=0xDBFF => self.memory.color_ram_read(addr, self.vic.last_data_bus()),
            0xDC00..=0xDCFF => self.cia1.read((addr & 0x0F) as u8),
            0xDD00..=0xDDFF => self.cia2.read((addr & 0x0F) as u8),
            0xDE00..=0xDEFF => self.expansion_port.peek_io1(addr, self.vic.last_data_bus()),
            0xDF00..=0xDFFF => self.expansion_port.peek_io2(addr, self.vic.last_data_bus()),
            _ => self.vic.last_data_bus(),
        }
    }

    fn poke(&mut self, addr: u16, value: u8) {
        if addr < 2 {
            self.cpu.write_port(addr, value);
            if addr == 0 {
                self.datasette.motor_on = self.cpu.port_output & 0x20 == 0;
                self.datasette.sense = self.cpu.port_output & 0x10 == 0;
            }
            self.recompute_banking();
            return;
        }
        match self.memory.poke_target(addr) {
            MemoryRegion::Ram => self.memory.ram_write(addr, value),
            MemoryRegion::CrtLow => self.expansion_port.poke_roml(addr, value),
            MemoryRegion::CrtHigh => self.expansion_port.poke_romh(addr, value),
            MemoryRegion::Io => self.poke_io(addr, value),
            MemoryRegion::Basic | MemoryRegion::Char | MemoryRegion::Kernal | MemoryRegion::Open => {}
            MemoryRegion::ProcessorPort => unreachable!("addr < 2 handled above"),
        }
    }

    fn poke_io(&mut self, addr: u16, value: u8) {
        let clock = self.clock;
        match addr {
            0xD000..=0xD3FF => self.vic.write_register(((addr - 0xD000) & 0x3F) as u8, value),
            0xD400..=0xD7FF => self.sid.write(clock, ((addr - 0xD400) & 0x1F) as u8, value),
            0xD800..=0xDBFF => self.memory.color_ram_write(addr, value),
            0xDC00..=0xDCFF => self.cia1.write((addr & 0x0F) as u8, value),
            0xDD00..=0xDDFF => self.cia2.write((addr & 0x0F) as u8, value),
            0xDE00..=0xDEFF => self.expansion_port.poke_io1(addr, value),
            0xDF00..=0xDFFF => self.expansion_port.poke_io2(addr, value),
            _ => {}
        }
    }

    fn vic_absolute(&self, bank: u8, addr: u16) -> u16 {
        ((bank as u16) << 14) | (addr & 0x3FFF)
    }

    /// Apply CIA2 port A's VIC-bank-select and IEC-contribution bits:
    /// bits 0-1 (inverted) select the VIC bank, bits 3-5 drive
    /// ATN/CLOCK/DATA out.
    fn update_cia2_outputs(&mut self) {
        let pa = self.cia2.output_a();
        self.vic.set_vic_bank((!pa) & 0x03);
        self.iec.set_c64_contribution(IecContribution {
            atn: pa & 0x08 == 0,
            clock: pa & 0x10 == 0,
            data: pa & 0x20 == 0,
        });
    }

    fn tick_drives(&mut self) {
        let lines = self.iec.lines();
        for i in 0..NUM_DRIVES {
            let (_, clock, data) = self.drives[i].tick(lines.atn, lines.clock, lines.data);
            self.iec.set_drive_contribution(i, IecContribution { atn: false, clock, data });
        }
    }

    /// Advance every component by exactly one master ϕ2 cycle, in the
    /// mandated order: VIC, CIA1, CIA2, CPU, expansion port, IEC, 1541s.
    pub fn tick(&mut self) {
        if self.jammed {
            return;
        }

        self.recompute_banking();

        let self_ptr: *mut Self = self;
        let ba_low = unsafe {
            let mem = &mut *self_ptr;
            self.vic.tick(mem)
        };

        if self.vic.irq_line() {
            self.messages.push(HostMessage::RasterIrq);
        }

        let cia1_irq = self.cia1.tick();
        let cia2_irq = self.cia2.tick();
        let _ = cia1_irq;
        let _ = cia2_irq;

        self.update_keyboard_and_joysticks();
        self.update_cia2_outputs();

        let nmi_line = self.cia2.irq_pending() || self.expansion_port.nmi_will_trigger();
        if nmi_line && !self.prev_nmi_line {
            self.expansion_port.execute_nmi_edge();
        }
        self.prev_nmi_line = nmi_line;

        if !ba_low {
            let bus_ptr: *mut Self = self;
            let boundary = unsafe {
                let bus = &mut *bus_ptr as &mut dyn Bus<Address = u16, Data = u8>;
                self.cpu.tick_with_bus(bus, BusMaster::Cpu(0))
            };
            if self.cpu.is_jammed() {
                self.jammed = true;
                self.messages.push(HostMessage::CpuJammed);
            } else if boundary {
                if self.breakpoints.contains(&self.cpu.pc) {
                    self.messages.push(HostMessage::BreakpointHit(self.cpu.pc));
                }
            }
        }

        self.tick_drives();
        let (atn_edge, went_idle) = self.iec.tick();
        let _ = atn_edge;
        if went_idle {
            self.messages.push(HostMessage::IecBusIdle);
        }

        self.sid.tick();

        if self.vic.take_frame_complete() {
            self.messages.push(HostMessage::FrameComplete);
        }

        self.clock += 1;
    }

    pub fn run_for(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.tick();
            if self.jammed {
                break;
            }
        }
    }

    fn cycles_per_frame(&self) -> u64 {
        let (w, h) = self.display_size();
        (w as u64 / 8) * h as u64
    }
}

impl VicBus for C64 {
    fn vic_read(&mut self, vic_bank: u8, addr: u16) -> u8 {
        let bank_addr = addr & 0x3FFF;
        if Memory::vic_char_rom_visible(vic_bank, bank_addr) {
            self.memory.char_rom[(bank_addr & 0x0FFF) as usize]
        } else {
            let abs = self.vic_absolute(vic_bank, addr);
            self.memory.ram_read(abs)
        }
    }

    fn color_ram_read(&mut self, index: u16) -> u8 {
        self.memory.color_ram_read(index, self.vic.last_data_bus())
    }
}

impl Bus for C64 {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        self.peek(addr)
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        self.poke(addr, data);
    }

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        false
    }

    fn check_interrupts(&self, _master: BusMaster) -> InterruptState {
        InterruptState {
            irq: self.cia1.irq_pending() || self.vic.irq_line(),
            nmi: self.cia2.irq_pending() || self.expansion_port.nmi_will_trigger(),
        }
    }
}

impl Machine for C64 {
    fn display_size(&self) -> (u32, u32) {
        match self.vic.standard {
            TvStandard::Pal => (504, 312),
            TvStandard::Ntsc => (520, 263),
        }
    }

    fn run_frame(&mut self) {
        let cycles = self.cycles_per_frame();
        self.run_for(cycles);
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        let (w, h) = self.display_size();
        let texture = self.vic.texture();
        for y in 0..h as usize {
            for x in 0..w as usize {
                let src = (y * vic::TEXTURE_SIZE + x) * 4;
                let dst = (y * w as usize + x) * 3;
                buffer[dst] = texture[src];
                buffer[dst + 1] = texture[src + 1];
                buffer[dst + 2] = texture[src + 2];
            }
        }
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        match button {
            0..=63 => {
                let row = (button >> 3) as usize;
                let col = (button & 0x07) as usize;
                self.set_key(row, col, pressed);
            }
            64..=68 => {
                let bit = 1u8 << (button - 64);
                if pressed {
                    self.joystick1.0 &= !bit;
                } else {
                    self.joystick1.0 |= bit;
                }
            }
            69..=73 => {
                let bit = 1u8 << (button - 69);
                if pressed {
                    self.joystick2.0 &= !bit;
                } else {
                    self.joystick2.0 |= bit;
                }
            }
            _ => {}
        }
    }

    fn input_map(&self) -> &[InputButton] {
        const BUTTONS: &[InputButton] = &[
            InputButton { id: 64, name: "Joystick 1 Up" },
            InputButton { id: 65, name: "Joystick 1 Down" },
            InputButton { id: 66, name: "Joystick 1 Left" },
            InputButton { id: 67, name: "Joystick 1 Right" },
            InputButton { id: 68, name: "Joystick 1 Fire" },
            InputButton { id: 69, name: "Joystick 2 Up" },
            InputButton { id: 70, name: "Joystick 2 Down" },
            InputButton { id: 71, name: "Joystick 2 Left" },
            InputButton { id: 72, name: "Joystick 2 Right" },
            InputButton { id: 73, name: "Joystick 2 Fire" },
        ];
        BUTTONS
    }

    fn reset(&mut self) {
        self.cpu = M6510::new();
        self.cia1 = Cia::new();
        self.cia2 = Cia::new();
        self.vic.reset();
        self.expansion_port.reset();
        self.recompute_banking();
        let lo = self.peek(0xFFFC);
        let hi = self.peek(0xFFFD);
        self.cpu.pc = u16::from_le_bytes([lo, hi]);
        self.jammed = false;
        for drive in &mut self.drives {
            drive.reset();
        }
        if !self.roms_loaded {
            self.messages.push(HostMessage::RomsMissing);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_drive_rom() -> [u8; 0x4000] {
        [0u8; 0x4000]
    }

    fn test_machine() -> C64 {
        let mut c64 = C64::new(TvStandard::Pal, blank_drive_rom());
        c64.load_roms([0u8; 0x2000], [0u8; 0x2000], [0u8; 0x1000]);
        c64.reset();
        c64
    }

    #[test]
    fn reset_loads_pc_from_reset_vector() {
        let mut c64 = test_machine();
        c64.memory.kernal_rom[0x1FFC] = 0x00;
        c64.memory.kernal_rom[0x1FFD] = 0xE0;
        c64.reset();
        assert_eq!(c64.cpu.pc, 0xE000);
    }

    #[test]
    fn ram_write_then_read_round_trips() {
        let mut c64 = test_machine();
        c64.poke(0x0400, 0x42);
        assert_eq!(c64.peek(0x0400), 0x42);
    }

    #[test]
    fn processor_port_write_updates_banking() {
        let mut c64 = test_machine();
        c64.poke(0x0000, 0xFF);
        c64.poke(0x0001, 0x00);
        assert_eq!(c64.memory.peek_src(0xA000), MemoryRegion::Ram);
        c64.poke(0x0001, 0x07);
        assert_eq!(c64.memory.peek_src(0xA000), MemoryRegion::Basic);
    }

    #[test]
    fn breakpoint_fires_a_host_message() {
        let mut c64 = test_machine();
        // NOP forever from $C000, with the reset vector pointed there.
        c64.memory.kernal_rom[0x1FFC] = 0x00;
        c64.memory.kernal_rom[0x1FFD] = 0xC0;
        c64.reset();
        for i in 0..0x2000 {
            c64.memory.ram[0xC000 + i] = 0xEA;
        }
        c64.add_breakpoint(0xC002);
        for _ in 0..16 {
            c64.tick();
        }
        let messages = c64.take_messages();
        assert!(messages.contains(&HostMessage::BreakpointHit(0xC002)));
    }

    #[test]
    fn jam_opcode_halts_the_scheduler() {
        let mut c64 = test_machine();
        c64.memory.kernal_rom[0x1FFC] = 0x00;
        c64.memory.kernal_rom[0x1FFD] = 0xC0;
        c64.reset();
        c64.memory.ram[0xC000] = 0x02; // JAM
        for _ in 0..8 {
            c64.tick();
        }
        assert!(c64.is_jammed());
    }

    #[test]
    fn vic_bank_follows_cia2_port_a() {
        let mut c64 = test_machine();
        c64.cia2.write(0x02, 0xFF); // DDRA all-output
        c64.cia2.write(0x00, 0b1111_1100); // bits 0-1 clear -> bank 3
        c64.update_cia2_outputs();
        assert_eq!(c64.vic.bank(), 3);
    }

    #[test]
    fn snapshot_round_trips_machine_state() {
        let mut c64 = test_machine();
        c64.memory.kernal_rom[0x1FFC] = 0x00;
        c64.memory.kernal_rom[0x1FFD] = 0xC0;
        c64.reset();
        for (i, byte) in [0xA9u8, 0x42, 0x8D, 0x00, 0xD0, 0xEA].iter().enumerate() {
            c64.memory.ram[0xC000 + i] = *byte;
        }
        c64.poke(0x0400, 0x99);
        c64.cia1.write(0x0E, 0x11); // start timer A, one-shot
        for _ in 0..37 {
            c64.tick();
        }
        let saved = c64.save_snapshot();

        let mut restored = C64::new(TvStandard::Pal, blank_drive_rom());
        restored.load_roms([0u8; 0x2000], [0u8; 0x2000], [0u8; 0x1000]);
        restored.memory.kernal_rom[0x1FFC] = 0x00;
        restored.memory.kernal_rom[0x1FFD] = 0xC0;
        restored.load_snapshot(&saved).unwrap();

        assert_eq!(restored.cpu.a, c64.cpu.a);
        assert_eq!(restored.cpu.x, c64.cpu.x);
        assert_eq!(restored.cpu.y, c64.cpu.y);
        assert_eq!(restored.cpu.pc, c64.cpu.pc);
        assert_eq!(restored.cpu.sp, c64.cpu.sp);
        assert_eq!(restored.cpu.p, c64.cpu.p);
        assert_eq!(restored.clock, c64.clock);
        assert_eq!(restored.peek(0x0400), c64.peek(0x0400));
        assert_eq!(restored.vic.raster_line(), c64.vic.raster_line());
        assert_eq!(restored.vic.raster_cycle(), c64.vic.raster_cycle());
        assert_eq!(restored.memory.ram, c64.memory.ram);

        // Continuing execution from the restored snapshot must behave
        // identically to continuing the original.
        for _ in 0..50 {
            c64.tick();
            restored.tick();
        }
        assert_eq!(restored.cpu.pc, c64.cpu.pc);
        assert_eq!(restored.clock, c64.clock);
        assert_eq!(restored.memory.ram, c64.memory.ram);
    }

    #[test]
    fn snapshot_rejects_foreign_magic() {
        let mut c64 = test_machine();
        let result = c64.load_snapshot(&[0xFF; 16]);
        assert!(matches!(result, Err(snapshot::SnapshotError::BadMagic)));
    }
}
