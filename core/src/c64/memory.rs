//! Main memory: 64 KiB RAM, the three built-in ROMs, color RAM, and the
//! 32-row bank table that the processor port and the cartridge's GAME/EXROM
//! lines select between.

/// What a 4 KiB page currently resolves to for reads (`peekSrc`) or writes
/// (`pokeTarget`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryRegion {
    Ram,
    Basic,
    Char,
    Kernal,
    Io,
    CrtLow,
    CrtHigh,
    /// Never produced by `update_banking`; addresses $00/$01 are special-cased
    /// by the top-level `C64` struct before the bank table is ever consulted.
    ProcessorPort,
    /// Ultimax mode leaves most of the address space disconnected.
    Open,
}

pub struct Memory {
    pub ram: Box<[u8; 0x10000]>,
    pub basic_rom: Box<[u8; 0x2000]>,
    pub char_rom: Box<[u8; 0x1000]>,
    pub kernal_rom: Box<[u8; 0x2000]>,
    pub color_ram: Box<[u8; 0x400]>,

    peek_src: [MemoryRegion; 16],
    poke_target: [MemoryRegion; 16],

    /// LORAM/HIRAM/CHAREN/GAME/EXROM, retained so `update_banking` can be
    /// re-invoked idempotently and so a snapshot can restore banking without
    /// replaying the individual writes that produced it.
    pub loram: bool,
    pub hiram: bool,
    pub charen: bool,
    pub game: bool,
    pub exrom: bool,
}

impl Memory {
    pub fn new() -> Self {
        let mut m = Self {
            ram: Box::new([0u8; 0x10000]),
            basic_rom: Box::new([0u8; 0x2000]),
            char_rom: Box::new([0u8; 0x1000]),
            kernal_rom: Box::new([0u8; 0x2000]),
            color_ram: Box::new([0u8; 0x400]),
            peek_src: [MemoryRegion::Ram; 16],
            poke_target: [MemoryRegion::Ram; 16],
            loram: true,
            hiram: true,
            charen: true,
            game: true,
            exrom: true,
        };
        m.update_banking(true, true, true, true, true);
        m
    }

    /// Recompute `peek_src`/`poke_target` from the processor-port bits and
    /// the cartridge's GAME/EXROM lines. This is the 32-row bank table
    /// collapsed into closed-form boolean logic: the four (exrom, game)
    /// combinations select the cartridge mode (16K/8K/Ultimax/off), and
    /// within each mode LORAM/HIRAM/CHAREN gate RAM vs. BASIC/CHAR/KERNAL/
    /// cartridge-ROM visibility exactly as the 32-row table enumerates.
    pub fn update_banking(
        &mut self,
        loram: bool,
        hiram: bool,
        charen: bool,
        game: bool,
        exrom: bool,
    ) {
        self.loram = loram;
        self.hiram = hiram;
        self.charen = charen;
        self.game = game;
        self.exrom = exrom;

        use MemoryRegion::*;

        // Ultimax: GAME=0, EXROM=1. Cartridge ROM at $8000-9FFF and
        // $E000-FFFF; $A000-CFFF and $1000-7FFF are open bus; $D000-DFFF is
        // always I/O regardless of CHAREN/HIRAM/LORAM.
        if !game && exrom {
            self.peek_src = [
                Ram, Open, Open, Open, Open, Open, Open, Open, // $0000-7FFF
                CrtLow, CrtLow, // $8000-9FFF
                Open, Open, // $A000-BFFF
                Open, // $C000-CFFF
                Io, // $D000-DFFF
                CrtHigh, CrtHigh, // $E000-FFFF
            ];
            self.poke_target = self.peek_src;
            self.poke_target[8] = Ram; // ROML writes still land on cart/RAM via CrtLow dispatch
            self.poke_target[9] = Ram;
            self.poke_target[0xE] = Ram;
            self.poke_target[0xF] = Ram;
            // Cartridge-mapped pages route to the cartridge's poke hook, not
            // plain RAM; restore CrtLow/CrtHigh for the poke table too.
            self.poke_target[8] = CrtLow;
            self.poke_target[9] = CrtLow;
            self.poke_target[0xE] = CrtHigh;
            self.poke_target[0xF] = CrtHigh;
            return;
        }

        // 16K mode (exrom=0, game=0) or 8K mode (exrom=0, game=1): both are
        // only reachable with a cartridge attached (no cartridge drives
        // GAME=1, EXROM=1). CRTLO is visible at $8000-9FFF when LORAM=1;
        // CRTHI (16K only) is visible at $A000-BFFF when HIRAM=1. In 8K mode
        // the $A000-BFFF window still shows the internal BASIC ROM when
        // HIRAM and LORAM are both set, matching the real 32-row table.
        let cart_attached = !exrom || !game;
        if cart_attached {
            let is_16k = !exrom && !game;
            let crt_low = loram;
            let mid = if is_16k {
                if hiram { CrtHigh } else { Ram }
            } else if hiram && loram {
                Basic
            } else {
                Ram
            };
            self.peek_src[0] = Ram;
            for page in self.peek_src[1..8].iter_mut() {
                *page = Ram;
            }
            self.peek_src[8] = if crt_low { CrtLow } else { Ram };
            self.peek_src[9] = self.peek_src[8];
            self.peek_src[0xA] = mid;
            self.peek_src[0xB] = mid;
            self.peek_src[0xC] = Ram;
            self.peek_src[0xD] = if charen && (hiram || loram) {
                Io
            } else if !charen && hiram && loram {
                Char
            } else {
                Ram
            };
            self.peek_src[0xE] = if hiram { Kernal } else { Ram };
            self.peek_src[0xF] = self.peek_src[0xE];

            self.poke_target = self.peek_src;
            if self.peek_src[0xA] == Basic {
                self.poke_target[0xA] = Ram;
                self.poke_target[0xB] = Ram;
            }
            if self.peek_src[0xD] == Char {
                self.poke_target[0xD] = Ram;
            }
            if self.peek_src[0xE] == Kernal {
                self.poke_target[0xE] = Ram;
                self.poke_target[0xF] = Ram;
            }
            return;
        }

        // Standard mode (no cartridge: exrom=1, game=1). The classic 8-way
        // LORAM/HIRAM/CHAREN table.
        let io_visible = charen && (hiram || loram);
        let char_visible = !charen && hiram && loram;
        let basic_visible = hiram && loram;
        let kernal_visible = hiram;

        self.peek_src = [Ram; 16];
        self.peek_src[0xA] = if basic_visible { Basic } else { Ram };
        self.peek_src[0xB] = self.peek_src[0xA];
        self.peek_src[0xD] = if io_visible {
            Io
        } else if char_visible {
            Char
        } else {
            Ram
        };
        self.peek_src[0xE] = if kernal_visible { Kernal } else { Ram };
        self.peek_src[0xF] = self.peek_src[0xE];

        self.poke_target = [Ram; 16];
        self.poke_target[0xD] = if io_visible { Io } else { Ram };
    }

    /// Saves RAM, color RAM, and the banking inputs; ROM images are not
    /// included (they're loaded once at startup via `load_roms` and never
    /// change). `update_banking` must be re-run after `load_state` to
    /// rebuild `peek_src`/`poke_target` from the restored inputs.
    pub fn save_state(&self, w: &mut crate::c64::snapshot::SnapshotWriter) {
        w.bytes(&*self.ram);
        w.bytes(&*self.color_ram);
        w.bool(self.loram);
        w.bool(self.hiram);
        w.bool(self.charen);
        w.bool(self.game);
        w.bool(self.exrom);
    }

    pub fn load_state(
        &mut self,
        r: &mut crate::c64::snapshot::SnapshotReader,
    ) -> Result<(), crate::c64::snapshot::SnapshotError> {
        self.ram.copy_from_slice(r.bytes(0x10000)?);
        self.color_ram.copy_from_slice(r.bytes(0x400)?);
        let loram = r.bool()?;
        let hiram = r.bool()?;
        let charen = r.bool()?;
        let game = r.bool()?;
        let exrom = r.bool()?;
        self.update_banking(loram, hiram, charen, game, exrom);
        Ok(())
    }

    pub fn peek_src(&self, addr: u16) -> MemoryRegion {
        self.peek_src[(addr >> 12) as usize]
    }

    pub fn poke_target(&self, addr: u16) -> MemoryRegion {
        self.poke_target[(addr >> 12) as usize]
    }

    #[inline]
    pub fn ram_read(&self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    #[inline]
    pub fn ram_write(&mut self, addr: u16, value: u8) {
        self.ram[addr as usize] = value;
    }

    pub fn basic_read(&self, addr: u16) -> u8 {
        self.basic_rom[(addr - 0xA000) as usize]
    }

    pub fn char_read(&self, addr: u16) -> u8 {
        self.char_rom[(addr - 0xD000) as usize]
    }

    pub fn kernal_read(&self, addr: u16) -> u8 {
        self.kernal_rom[(addr - 0xE000) as usize]
    }

    /// Reads out the VIC's view of character ROM at $1000-1FFF/$9000-9FFF
    /// within VIC banks 0 and 2, independent of the CPU-side bank table
    /// (the VIC address bus is wired straight to the CHAROM chip-select
    /// regardless of CPU banking).
    pub fn vic_char_rom_visible(vic_bank: u8, bank_addr: u16) -> bool {
        (vic_bank == 0 || vic_bank == 2) && (0x1000..0x2000).contains(&bank_addr)
    }

    /// Color RAM stores only the low nibble; the high nibble returned on a
    /// read is the VIC's last data-bus byte (the documented choice recorded
    /// in DESIGN.md for the "floating bus bits" invariant).
    pub fn color_ram_read(&self, addr: u16, vic_last_data_bus: u8) -> u8 {
        (self.color_ram[(addr & 0x3FF) as usize] & 0x0F) | (vic_last_data_bus & 0xF0)
    }

    pub fn color_ram_write(&mut self, addr: u16, value: u8) {
        self.color_ram[(addr & 0x3FF) as usize] = value & 0x0F;
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
