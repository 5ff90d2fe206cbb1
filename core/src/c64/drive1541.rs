//! The 1541 floppy drive: its own 6502 (no processor port), 2 KiB RAM
//! mirrored through $0000-$1FFF, 16 KiB ROM at $C000-$FFFF, two 6522 VIAs,
//! and a GCR disk model. The VIA1/VIA2 wiring (port bit assignments,
//! ATN-ack, write-mode via CB2) follows the real drive's schematic. Reuses
//! `cpu::m6502::M6502` (identical to the 6510 minus the processor port)
//! and `device::via6522::Via6522` rather than a third CPU/VIA copy.

use crate::core::bus::InterruptState;
use crate::core::component::BusMasterComponent;
use crate::core::{Bus, BusMaster};
use crate::cpu::m6502::M6502;
use crate::cpu::Cpu;
use crate::device::Via6522;

pub const TRACK_COUNT: usize = 42;
/// Max GCR bytes on the longest (innermost, zone 0) track.
pub const MAX_TRACK_BYTES: usize = 7928;

/// Drive-side bus: 2 KiB RAM (mirrored to fill $0000-$7FFF on real
/// hardware address decode, but only $0000-$07FF is backed by silicon),
/// VIA1 at $1800-$180F, VIA2 at $1C00-$1C0F, 16 KiB ROM at $C000-$FFFF.
struct DriveBus<'a> {
    ram: &'a mut [u8; 0x800],
    rom: &'a [u8; 0x4000],
    via1: &'a mut Via6522,
    via2: &'a mut Via6522,
}

impl Bus for DriveBus<'_> {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        match addr {
            0x0000..=0x0FFF => self.ram[(addr & 0x07FF) as usize],
            0x1800..=0x180F => self.via1.read((addr & 0xF) as u8),
            0x1C00..=0x1C0F => self.via2.read((addr & 0xF) as u8),
            0xC000..=0xFFFF => self.rom[(addr - 0xC000) as usize],
            _ => 0xFF,
        }
    }

    fn write(&mut self, _master: BusMaster, addr: u16, value: u8) {
        match addr {
            0x0000..=0x0FFF => self.ram[(addr & 0x07FF) as usize] = value,
            0x1800..=0x180F => self.via1.write((addr & 0xF) as u8, value),
            0x1C00..=0x1C0F => self.via2.write((addr & 0xF) as u8, value),
            _ => {}
        }
    }

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        false
    }

    fn check_interrupts(&self, _master: BusMaster) -> InterruptState {
        InterruptState {
            irq: self.via1.irq() || self.via2.irq(),
            nmi: false,
        }
    }
}

/// Speed-zone bit-cell width in master cycles per GCR byte (8 bit cells),
/// approximated from the 1541's four density zones (tracks 1-17, 18-24,
/// 25-30, 31-42).
fn cycles_per_byte(track: u8) -> u32 {
    match track {
        1..=17 => 16 * 4,
        18..=24 => 15 * 4,
        25..=30 => 14 * 4,
        _ => 13 * 4,
    }
}

pub struct Drive1541 {
    cpu: M6502,
    ram: Box<[u8; 0x800]>,
    rom: Box<[u8; 0x4000]>,
    via1: Via6522,
    via2: Via6522,

    pub connected: bool,
    half_track: u8,
    motor_on: bool,
    led_on: bool,
    write_protect: bool,
    modified: bool,

    tracks: Vec<Vec<u8>>,
    head_byte: usize,
    byte_counter: u32,
    write_mode: bool,
    prev_write_mode: bool,
    prev_stepper_phase: u8,
    prev_atn: bool,
}

impl Drive1541 {
    pub fn new(rom: [u8; 0x4000]) -> Self {
        let mut cpu = M6502::new();
        let lo = rom[0x3FFC] as u16;
        let hi = rom[0x3FFD] as u16;
        cpu.pc = lo | (hi << 8);
        Self {
            cpu,
            ram: Box::new([0u8; 0x800]),
            rom: Box::new(rom),
            via1: Via6522::new(),
            via2: Via6522::new(),
            connected: true,
            half_track: 34, // track 18 * 2 - 2, the directory track
            motor_on: false,
            led_on: false,
            write_protect: false,
            modified: false,
            tracks: vec![Vec::new(); TRACK_COUNT],
            head_byte: 0,
            byte_counter: 0,
            write_mode: false,
            prev_write_mode: false,
            prev_stepper_phase: 0,
            prev_atn: true,
        }
    }

    pub fn load_gcr_tracks(&mut self, tracks: Vec<Vec<u8>>) {
        self.tracks = tracks;
        if self.tracks.len() < TRACK_COUNT {
            self.tracks.resize(TRACK_COUNT, Vec::new());
        }
        self.head_byte = 0;
        self.modified = false;
    }

    pub fn eject(&mut self) {
        self.tracks = vec![Vec::new(); TRACK_COUNT];
        self.head_byte = 0;
        self.modified = false;
    }

    pub fn has_disk(&self) -> bool {
        self.tracks.iter().any(|t| !t.is_empty())
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn track_data(&self) -> &[Vec<u8>] {
        &self.tracks
    }

    pub fn track(&self) -> u8 {
        self.half_track / 2 + 1
    }

    pub fn motor_on(&self) -> bool {
        self.motor_on
    }

    pub fn led_on(&self) -> bool {
        self.led_on
    }

    /// Saves the drive's CPU, RAM, both VIAs, and the GCR disk image
    /// currently loaded. The ROM image is not included (fixed at
    /// construction, identical across every snapshot).
    pub fn save_state(&self, w: &mut crate::c64::snapshot::SnapshotWriter) {
        self.cpu.save_state(w);
        w.bytes(&*self.ram);
        self.via1.save_state(w);
        self.via2.save_state(w);
        w.bool(self.connected);
        w.u8(self.half_track);
        w.bool(self.motor_on);
        w.bool(self.led_on);
        w.bool(self.write_protect);
        w.bool(self.modified);
        w.u32(self.tracks.len() as u32);
        for track in &self.tracks {
            w.u32(track.len() as u32);
            w.bytes(track);
        }
        w.u32(self.head_byte as u32);
        w.u32(self.byte_counter);
        w.bool(self.write_mode);
        w.bool(self.prev_write_mode);
        w.u8(self.prev_stepper_phase);
        w.bool(self.prev_atn);
    }

    pub fn load_state(
        &mut self,
        r: &mut crate::c64::snapshot::SnapshotReader,
    ) -> Result<(), crate::c64::snapshot::SnapshotError> {
        self.cpu.load_state(r)?;
        self.ram.copy_from_slice(r.bytes(0x800)?);
        self.via1.load_state(r)?;
        self.via2.load_state(r)?;
        self.connected = r.bool()?;
        self.half_track = r.u8()?;
        self.motor_on = r.bool()?;
        self.led_on = r.bool()?;
        self.write_protect = r.bool()?;
        self.modified = r.bool()?;
        let track_count = r.u32()? as usize;
        let mut tracks = Vec::with_capacity(track_count);
        for _ in 0..track_count {
            let len = r.u32()? as usize;
            tracks.push(r.bytes(len)?.to_vec());
        }
        self.tracks = tracks;
        self.head_byte = r.u32()? as usize;
        self.byte_counter = r.u32()?;
        self.write_mode = r.bool()?;
        self.prev_write_mode = r.bool()?;
        self.prev_stepper_phase = r.u8()?;
        self.prev_atn = r.bool()?;
        Ok(())
    }

    fn current_track_index(&self) -> usize {
        ((self.half_track / 2) as usize).min(TRACK_COUNT - 1)
    }

    fn step_head(&mut self, phase: u8) {
        let prev = self.prev_stepper_phase;
        let advance = (phase == (prev + 1) % 4) as i16;
        let retreat = (phase == (prev + 3) % 4) as i16;
        let delta = advance - retreat;
        let next = self.half_track as i16 + delta;
        self.half_track = next.clamp(0, (TRACK_COUNT as i16) * 2 - 1) as u8;
        self.head_byte = 0;
    }

    /// Advance one master cycle. `iec_atn`/`iec_clock`/`iec_data` are the
    /// current bus-level line states (true = released/high); returns this
    /// drive's contribution for the caller to OR into the bus re-evaluation.
    pub fn tick(&mut self, atn: bool, clock: bool, data: bool) -> (bool, bool, bool) {
        if !self.connected {
            return (false, false, false);
        }

        let atn_asserted = !atn;
        let mut via1_external_b = self.via1.output_b() & 0x12;
        if !data {
            via1_external_b |= 0x01;
        }
        if !clock {
            via1_external_b |= 0x04;
        }
        if atn {
            via1_external_b |= 0x80;
        }
        self.via1.set_port_b_input(via1_external_b);

        if atn_asserted != self.prev_atn {
            self.via1.set_ca1(atn_asserted);
            self.prev_atn = atn_asserted;
        }

        {
            let mut bus = DriveBus {
                ram: &mut self.ram,
                rom: &self.rom,
                via1: &mut self.via1,
                via2: &mut self.via2,
            };
            self.cpu.tick_with_bus(&mut bus, BusMaster::Cpu(1));
        }
        self.via1.tick();
        self.via2.tick();

        let pb1 = self.via1.output_b();
        let atn_ack = pb1 & 0x10 != 0;
        let drive_data = (pb1 & 0x02 != 0) || atn_ack;
        let drive_clock = pb1 & 0x08 != 0;

        self.update_mechanics();
        self.advance_disk();

        (false, drive_clock, drive_data)
    }

    fn update_mechanics(&mut self) {
        let pb = self.via2.output_b();
        self.motor_on = pb & 0x04 != 0;
        self.led_on = pb & 0x08 != 0;

        let phase = pb & 0x03;
        if phase != self.prev_stepper_phase {
            self.step_head(phase);
        }
        self.prev_stepper_phase = phase;

        let wp_bit = if self.write_protect { 0x00 } else { 0x10 };
        let via2_ext = (self.via2.output_b() & !0x10) | wp_bit;
        self.via2.set_port_b_input(via2_ext);

        self.prev_write_mode = self.write_mode;
        // CB2 manual-output-low encodes write mode (PCR bits 5-7 = 110).
        self.write_mode = pb & 0x20 == 0 && pb & 0x40 != 0;
    }

    fn advance_disk(&mut self) {
        if !self.motor_on {
            return;
        }
        let track_idx = self.current_track_index();
        if self.tracks[track_idx].is_empty() {
            return;
        }
        self.byte_counter += 1;
        let cpb = cycles_per_byte(self.track());
        if self.byte_counter < cpb {
            return;
        }
        self.byte_counter = 0;

        let track_len = self.tracks[track_idx].len();
        if self.write_mode {
            let byte = self.via2.output_a();
            self.tracks[track_idx][self.head_byte % track_len] = byte;
            self.modified = true;
        } else {
            let byte = self.tracks[track_idx][self.head_byte % track_len];
            self.via2.set_port_a_input(byte);
            let in_sync = byte == 0xFF;
            let current = self.via2.output_b();
            let updated = (current & !0x80) | if in_sync { 0x00 } else { 0x80 };
            self.via2.set_port_b_input(updated);
        }
        self.head_byte = (self.head_byte + 1) % track_len;
    }

    pub fn reset(&mut self) {
        self.cpu.reset();
        let lo = self.rom[0x3FFC] as u16;
        let hi = self.rom[0x3FFD] as u16;
        self.cpu.pc = lo | (hi << 8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_rom() -> [u8; 0x4000] {
        let mut rom = [0u8; 0x4000];
        rom[0x3FFC] = 0x00;
        rom[0x3FFD] = 0xC0;
        rom
    }

    #[test]
    fn reset_vector_loaded_from_rom() {
        let drive = Drive1541::new(blank_rom());
        assert_eq!(drive.cpu.pc, 0xC000);
    }

    #[test]
    fn disconnected_drive_does_not_tick() {
        let mut drive = Drive1541::new(blank_rom());
        drive.connected = false;
        let before = drive.cpu.pc;
        drive.tick(true, true, true);
        assert_eq!(drive.cpu.pc, before);
    }

    #[test]
    fn starts_on_directory_track_18() {
        let drive = Drive1541::new(blank_rom());
        assert_eq!(drive.track(), 18);
    }

    #[test]
    fn no_disk_reports_not_present() {
        let drive = Drive1541::new(blank_rom());
        assert!(!drive.has_disk());
    }
}
