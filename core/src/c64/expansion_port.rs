//! The expansion port: a thin wrapper around an optional `Cartridge` plus
//! the GAME/EXROM pins. Grounded on
//! `examples/original_source/Emulator/Ports/ExpansionPort.cpp`'s
//! `getCartridgeMode()`/`setCartridgeMode()`/`attachCartridge()` — confirmed
//! mode mapping: `(exrom?0b10:0)|(game?0b01:0)` → 0b00 16K, 0b01 8K,
//! 0b10 Ultimax, 0b11 (the no-cartridge default) off/standard.

use super::cartridge::Cartridge;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CartridgeMode {
    Mode16k,
    Mode8k,
    Ultimax,
    Off,
}

pub fn cartridge_mode(game: bool, exrom: bool) -> CartridgeMode {
    match ((exrom as u8) << 1) | (game as u8) {
        0b00 => CartridgeMode::Mode16k,
        0b01 => CartridgeMode::Mode8k,
        0b10 => CartridgeMode::Ultimax,
        _ => CartridgeMode::Off,
    }
}

pub struct ExpansionPort {
    pub cartridge: Option<Cartridge>,
    /// GAME/EXROM lines when no cartridge is attached: both pulled high.
    game: bool,
    exrom: bool,
}

impl ExpansionPort {
    pub fn new() -> Self {
        Self {
            cartridge: None,
            game: true,
            exrom: true,
        }
    }

    pub fn attach(&mut self, cartridge: Cartridge) {
        self.cartridge = Some(cartridge);
    }

    pub fn detach(&mut self) {
        self.cartridge = None;
        self.game = true;
        self.exrom = true;
    }

    pub fn game(&self) -> bool {
        self.cartridge.as_ref().map(|c| c.game).unwrap_or(self.game)
    }

    pub fn exrom(&self) -> bool {
        self.cartridge.as_ref().map(|c| c.exrom).unwrap_or(self.exrom)
    }

    pub fn mode(&self) -> CartridgeMode {
        cartridge_mode(self.game(), self.exrom())
    }

    /// $8000-9FFF. `vic_last_data_bus` feeds the no-cartridge open-bus read.
    pub fn peek_roml(&self, addr: u16, vic_last_data_bus: u8) -> u8 {
        match &self.cartridge {
            Some(cart) => cart.peek(addr),
            None => vic_last_data_bus,
        }
    }

    /// $A000-BFFF (16K mode) or $E000-FFFF (Ultimax).
    pub fn peek_romh(&self, addr: u16, vic_last_data_bus: u8) -> u8 {
        match &self.cartridge {
            Some(cart) => cart.peek_high(addr),
            None => vic_last_data_bus,
        }
    }

    pub fn poke_roml(&mut self, addr: u16, value: u8) {
        if let Some(cart) = &mut self.cartridge {
            cart.poke(addr, value);
        }
    }

    pub fn poke_romh(&mut self, addr: u16, value: u8) {
        if let Some(cart) = &mut self.cartridge {
            cart.poke_high(addr, value);
        }
    }

    pub fn peek_io1(&self, addr: u16, vic_last_data_bus: u8) -> u8 {
        match &self.cartridge {
            Some(cart) => cart.peek_io1(addr),
            None => vic_last_data_bus,
        }
    }

    pub fn peek_io2(&self, addr: u16, vic_last_data_bus: u8) -> u8 {
        match &self.cartridge {
            Some(cart) => cart.peek_io2(addr),
            None => vic_last_data_bus,
        }
    }

    pub fn poke_io1(&mut self, addr: u16, value: u8) {
        if let Some(cart) = &mut self.cartridge {
            cart.poke_io1(addr, value);
        }
    }

    pub fn poke_io2(&mut self, addr: u16, value: u8) {
        if let Some(cart) = &mut self.cartridge {
            cart.poke_io2(addr, value);
        }
    }

    pub fn nmi_will_trigger(&self) -> bool {
        self.cartridge.as_ref().map(|c| c.nmi_will_trigger()).unwrap_or(false)
    }

    /// Called by the top-level scheduler on every rising edge of the NMI
    /// line it feeds the CPU, so cartridges that arm on NMI (Expert) see it
    /// regardless of which source (freezer, host) raised the line.
    pub fn execute_nmi_edge(&mut self) {
        if let Some(cart) = &mut self.cartridge {
            cart.execute_nmi_edge();
        }
    }

    pub fn reset(&mut self) {
        if let Some(cart) = &mut self.cartridge {
            cart.reset();
        } else {
            self.game = true;
            self.exrom = true;
        }
    }

    pub fn save_state(&self, w: &mut crate::c64::snapshot::SnapshotWriter) {
        match &self.cartridge {
            Some(cart) => {
                w.bool(true);
                cart.save_state(w);
            }
            None => w.bool(false),
        }
        w.bool(self.game);
        w.bool(self.exrom);
    }

    pub fn load_state(
        &mut self,
        r: &mut crate::c64::snapshot::SnapshotReader,
    ) -> Result<(), crate::c64::snapshot::SnapshotError> {
        if r.bool()? {
            let mut cart = Cartridge::new(super::cartridge::CartridgeKind::Normal, Vec::new(), true, true);
            cart.load_state(r)?;
            self.cartridge = Some(cart);
        } else {
            self.cartridge = None;
        }
        self.game = r.bool()?;
        self.exrom = r.bool()?;
        Ok(())
    }
}

impl Default for ExpansionPort {
    fn default() -> Self {
        Self::new()
    }
}
