//! VIC-II (6569 PAL / 6567 NTSC) video chip.
//!
//! One `tick()` call advances the beam by one ϕ2 cycle and renders the 8
//! pixels belonging to it, following a fixed per-cycle order: ϕ2.5 fetch
//! completion, ϕ1.1 frame flip-flop logic, ϕ1.2 pixel draw, ϕ1.3 next
//! access dispatch, ϕ2.1 raster IRQ, ϕ2.2 sprite DMA logic, ϕ2.3 VC/RC
//! advance, ϕ2.4 BA. Extended with sprites (MC/MCBASE logic),
//! bitmap/multicolor/ECM display modes, collisions, and the BA-precedes-
//! DMA-by-3-cycles rule from `examples/original_source/C64/VICII/*`.

pub const NUM_SPRITES: usize = 8;

/// What kind of DRAM access the VIC performs this cycle's ϕ1.3 slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    Idle,
    Refresh,
    Pointer(usize),
    SpriteData(usize),
    Char,
    Graphics,
}

/// What the VIC needs from the memory subsystem. The top-level `C64`
/// implements this directly against `Memory`/`ExpansionPort` so the VIC
/// never needs a `Bus` trait object (it never drives CPU-visible banking).
pub trait VicBus {
    /// Read a byte through the VIC's own address bus (14-bit, relative to
    /// the selected 16K VIC bank), seeing character ROM in banks 0/2 and
    /// RAM everywhere else.
    fn vic_read(&mut self, vic_bank: u8, addr: u16) -> u8;
    /// Color RAM nibble for video-matrix column `index` (0-999), high
    /// nibble filled from the VIC's own last data-bus byte by the caller.
    fn color_ram_read(&mut self, index: u16) -> u8;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TvStandard {
    Pal,
    Ntsc,
}

impl TvStandard {
    fn lines_per_frame(self) -> u16 {
        match self {
            TvStandard::Pal => 312,
            TvStandard::Ntsc => 263,
        }
    }
    fn cycles_per_line(self) -> u8 {
        match self {
            TvStandard::Pal => 63,
            TvStandard::Ntsc => 65,
        }
    }
}

pub const TEXTURE_SIZE: usize = 512;

/// 16-entry RGB palette, computed once at configure time from the classic
/// Pepto PAL luma/chroma table (a commonly cited, widely reused measured
/// palette). Monochrome variants replace chroma with a fixed tint.
pub const DEFAULT_PALETTE: [(u8, u8, u8); 16] = [
    (0x00, 0x00, 0x00),
    (0xFF, 0xFF, 0xFF),
    (0x68, 0x37, 0x2B),
    (0x70, 0xA4, 0xB2),
    (0x6F, 0x3D, 0x86),
    (0x58, 0x8D, 0x43),
    (0x35, 0x28, 0x79),
    (0xB8, 0xC7, 0x6F),
    (0x6F, 0x4F, 0x25),
    (0x43, 0x39, 0x00),
    (0x9A, 0x67, 0x59),
    (0x44, 0x44, 0x44),
    (0x6C, 0x6C, 0x6C),
    (0x9A, 0xD2, 0x84),
    (0x6C, 0x5E, 0xB5),
    (0x95, 0x95, 0x95),
];

struct SpriteUnit {
    dma: bool,
    display: bool,
    mc: u8,
    mc_base: u8,
    exp_flop: bool,
    pointer: u8,
    data: [u8; 3],
    shift: u32,
    x_counter: u16,
}

impl SpriteUnit {
    fn new() -> Self {
        Self {
            dma: false,
            display: false,
            mc: 0,
            mc_base: 0,
            exp_flop: true,
            pointer: 0,
            data: [0; 3],
            shift: 0,
            x_counter: 0,
        }
    }
}

pub struct Vic {
    pub standard: TvStandard,
    regs: [u8; 0x40],

    raster_line: u16,
    raster_cycle: u16,
    raster_compare: u16,

    irr: u8,
    imr: u8,

    vc: u16,
    vc_base: u16,
    rc: u8,
    vmli: u8,

    den_latch: bool,
    bad_line: bool,
    main_border: bool,
    vertical_border: bool,

    video_matrix: [u8; 40],
    color_line: [u8; 40],

    vic_bank: u8,
    last_data_bus: u8,

    sprites: [SpriteUnit; NUM_SPRITES],
    collision_sprite_sprite: u8,
    collision_sprite_bg: u8,

    ba_low: bool,
    /// Cycles until the BA line, already lowered, actually steals the bus
    /// (the real 3-cycle BA-to-AEC delay).
    ba_delay: u8,

    texture: Box<[u8; TEXTURE_SIZE * TEXTURE_SIZE * 4]>,
    frame_complete: bool,
    palette: [(u8, u8, u8); 16],
}

const IRR_RASTER: u8 = 0x01;
const IRR_SPRITE_BG: u8 = 0x02;
const IRR_SPRITE_SPRITE: u8 = 0x04;
const IRR_LIGHTPEN: u8 = 0x08;

impl Vic {
    pub fn new(standard: TvStandard) -> Self {
        Self {
            standard,
            regs: [0; 0x40],
            raster_line: 0,
            raster_cycle: 1,
            raster_compare: 0,
            irr: 0,
            imr: 0,
            vc: 0,
            vc_base: 0,
            rc: 0,
            vmli: 0,
            den_latch: false,
            bad_line: false,
            main_border: false,
            vertical_border: false,
            video_matrix: [0; 40],
            color_line: [0; 40],
            vic_bank: 0,
            last_data_bus: 0,
            sprites: std::array::from_fn(|_| SpriteUnit::new()),
            collision_sprite_sprite: 0,
            collision_sprite_bg: 0,
            ba_low: false,
            ba_delay: 0,
            texture: Box::new([0u8; TEXTURE_SIZE * TEXTURE_SIZE * 4]),
            frame_complete: false,
            palette: DEFAULT_PALETTE,
        }
    }

    pub fn reset(&mut self) {
        *self = Vic::new(self.standard);
    }

    pub fn set_vic_bank(&mut self, bank: u8) {
        self.vic_bank = bank & 0x03;
    }

    pub fn set_monochrome(&mut self, tint: Option<(u8, u8, u8)>) {
        match tint {
            None => self.palette = DEFAULT_PALETTE,
            Some((_, _, _)) => {
                for (i, entry) in self.palette.iter_mut().enumerate() {
                    let luma = DEFAULT_PALETTE[i].0 as u32 * 30
                        + DEFAULT_PALETTE[i].1 as u32 * 59
                        + DEFAULT_PALETTE[i].2 as u32 * 11;
                    let l = (luma / 100) as u8;
                    *entry = (l, l, l);
                }
            }
        }
    }

    /// Saves register and timing state needed to resume cycle-accurate
    /// emulation. The rendered `texture` and the host-configurable
    /// `palette` are not included: both are fully re-derived from register
    /// state and display settings within one frame, and are host/render
    /// concerns rather than hardware state.
    pub fn save_state(&self, w: &mut crate::c64::snapshot::SnapshotWriter) {
        w.bytes(&self.regs);
        w.u16(self.raster_line);
        w.u16(self.raster_cycle);
        w.u16(self.raster_compare);
        w.u8(self.irr);
        w.u8(self.imr);
        w.u16(self.vc);
        w.u16(self.vc_base);
        w.u8(self.rc);
        w.u8(self.vmli);
        w.bool(self.den_latch);
        w.bool(self.bad_line);
        w.bool(self.main_border);
        w.bool(self.vertical_border);
        w.bytes(&self.video_matrix);
        w.bytes(&self.color_line);
        w.u8(self.vic_bank);
        w.u8(self.last_data_bus);
        for sprite in &self.sprites {
            w.bool(sprite.dma);
            w.bool(sprite.display);
            w.u8(sprite.mc);
            w.u8(sprite.mc_base);
            w.bool(sprite.exp_flop);
            w.u8(sprite.pointer);
            w.bytes(&sprite.data);
            w.u32(sprite.shift);
            w.u16(sprite.x_counter);
        }
        w.u8(self.collision_sprite_sprite);
        w.u8(self.collision_sprite_bg);
        w.bool(self.ba_low);
        w.u8(self.ba_delay);
        w.bool(self.frame_complete);
    }

    pub fn load_state(
        &mut self,
        r: &mut crate::c64::snapshot::SnapshotReader,
    ) -> Result<(), crate::c64::snapshot::SnapshotError> {
        self.regs.copy_from_slice(r.bytes(0x40)?);
        self.raster_line = r.u16()?;
        self.raster_cycle = r.u16()?;
        self.raster_compare = r.u16()?;
        self.irr = r.u8()?;
        self.imr = r.u8()?;
        self.vc = r.u16()?;
        self.vc_base = r.u16()?;
        self.rc = r.u8()?;
        self.vmli = r.u8()?;
        self.den_latch = r.bool()?;
        self.bad_line = r.bool()?;
        self.main_border = r.bool()?;
        self.vertical_border = r.bool()?;
        self.video_matrix.copy_from_slice(r.bytes(40)?);
        self.color_line.copy_from_slice(r.bytes(40)?);
        self.vic_bank = r.u8()?;
        self.last_data_bus = r.u8()?;
        for sprite in &mut self.sprites {
            sprite.dma = r.bool()?;
            sprite.display = r.bool()?;
            sprite.mc = r.u8()?;
            sprite.mc_base = r.u8()?;
            sprite.exp_flop = r.bool()?;
            sprite.pointer = r.u8()?;
            sprite.data.copy_from_slice(r.bytes(3)?);
            sprite.shift = r.u32()?;
            sprite.x_counter = r.u16()?;
        }
        self.collision_sprite_sprite = r.u8()?;
        self.collision_sprite_bg = r.u8()?;
        self.ba_low = r.bool()?;
        self.ba_delay = r.u8()?;
        self.frame_complete = r.bool()?;
        Ok(())
    }

    fn den(&self) -> bool {
        self.regs[0x11] & 0x10 != 0
    }
    fn ecm(&self) -> bool {
        self.regs[0x11] & 0x40 != 0
    }
    fn bmm(&self) -> bool {
        self.regs[0x11] & 0x20 != 0
    }
    fn rsel(&self) -> bool {
        self.regs[0x11] & 0x08 != 0
    }
    fn csel(&self) -> bool {
        self.regs[0x16] & 0x08 != 0
    }
    fn mcm(&self) -> bool {
        self.regs[0x16] & 0x10 != 0
    }
    fn yscroll(&self) -> u8 {
        self.regs[0x11] & 0x07
    }
    fn xscroll(&self) -> u8 {
        self.regs[0x16] & 0x07
    }
    fn screen_base(&self) -> u16 {
        (((self.regs[0x18] >> 4) & 0x0F) as u16) * 0x0400
    }
    fn char_base(&self) -> u16 {
        (((self.regs[0x18] >> 1) & 0x07) as u16) * 0x0800
    }

    fn first_display_line(&self) -> u16 {
        0x30
    }
    fn last_display_line(&self) -> u16 {
        0xF8
    }

    /// Advance one ϕ2 cycle. Returns true if the BA line is low (CPU must
    /// treat this cycle as bus-unavailable for reads).
    pub fn tick<M: VicBus>(&mut self, mem: &mut M) -> bool {
        self.evaluate_bad_line();
        self.draw_cycle(mem);
        self.fetch_cycle(mem);
        self.raster_irq_check();
        self.sprite_dma_logic();
        self.vc_rc_logic();
        self.ba_logic();

        self.raster_cycle += 1;
        let cpl = self.standard.cycles_per_line() as u16;
        if self.raster_cycle > cpl {
            self.raster_cycle = 1;
            self.raster_line += 1;
            if self.raster_line >= self.standard.lines_per_frame() {
                self.raster_line = 0;
                self.frame_complete = true;
            }
        }

        self.ba_low
    }

    fn evaluate_bad_line(&mut self) {
        if self.raster_line == self.first_display_line() && self.den() {
            self.den_latch = true;
        }
        self.bad_line = self.den_latch
            && (self.first_display_line()..self.last_display_line()).contains(&self.raster_line)
            && (self.raster_line & 7) as u8 == self.yscroll();
    }

    /// ϕ1.3: start this cycle's memory access and, for c/g-accesses, stash
    /// the result for the *next* cycle's draw (the real VIC pipelines one
    /// cycle of fetch-ahead; this model folds fetch and use into the same
    /// `tick()` call, which is externally equivalent for a single-threaded
    /// simulation with no mid-cycle observers).
    fn fetch_cycle<M: VicBus>(&mut self, mem: &mut M) {
        let cyc = self.raster_cycle;

        if self.bad_line && (15..=54).contains(&cyc) {
            let col = (cyc - 15) as usize;
            let addr = self.screen_base() + self.vc;
            let byte = mem.vic_read(self.vic_bank, addr & 0x3FFF);
            self.video_matrix[col] = byte;
            self.color_line[col] = mem.color_ram_read(self.vc) & 0x0F;
            self.last_data_bus = byte;
        }

        // Sprite p-access/s-access cycles: the pointer fetch at cycle
        // (58 + 2*i) mod cpl, followed by the three s-accesses that read
        // one row (3 bytes) of sprite data for active sprites.
        let cpl = self.standard.cycles_per_line() as u16;
        for i in 0..NUM_SPRITES {
            let p_cycle = (58 + 2 * i as u16) % cpl;
            if cyc == p_cycle + 1 && self.sprites[i].dma {
                let ptr_addr = self.screen_base() + 0x3F8 + i as u16;
                self.sprites[i].pointer = mem.vic_read(self.vic_bank, ptr_addr & 0x3FFF);
            }
            if self.sprites[i].dma {
                for (offset, s_cycle) in [(0u16, p_cycle + 2), (1, p_cycle + 3), (2, p_cycle + 4)] {
                    if cyc == s_cycle {
                        let base =
                            (self.sprites[i].pointer as u16) * 64 + self.sprites[i].mc as u16 + offset;
                        self.sprites[i].data[offset as usize] =
                            mem.vic_read(self.vic_bank, base & 0x3FFF);
                    }
                }
                if cyc == p_cycle + 4 {
                    // All three bytes of this row fetched: advance MC, and
                    // latch it into MCBASE for the next row on the cycle the
                    // expansion flip-flop gates (every row for unexpanded
                    // sprites, every other row when Y-expanded). MCBASE
                    // reaching the end of the 63-byte sequence ends DMA.
                    self.sprites[i].mc = (self.sprites[i].mc + 3) & 0x3F;
                    if self.sprites[i].exp_flop {
                        self.sprites[i].mc_base = self.sprites[i].mc;
                        if self.sprites[i].mc_base >= 63 {
                            self.sprites[i].dma = false;
                        }
                    }
                }
            }
        }
    }

    fn raster_irq_check(&mut self) {
        if self.raster_cycle == 1 && self.raster_line == self.raster_compare {
            self.irr |= IRR_RASTER;
        }
    }

    fn sprite_dma_logic(&mut self) {
        let cyc = self.raster_cycle;
        if cyc != 55 {
            return;
        }
        let enable = self.regs[0x15];
        let y_expand = self.regs[0x17];
        let y = (self.raster_line & 0xFF) as u8;
        for i in 0..NUM_SPRITES {
            let mask = 1u8 << i;
            let sprite_y_match = y == self.regs[i * 2 + 1];
            if (enable & mask) != 0 && sprite_y_match && !self.sprites[i].dma {
                self.sprites[i].dma = true;
                self.sprites[i].mc_base = 0;
                self.sprites[i].exp_flop = true;
            }
            if self.sprites[i].dma {
                self.sprites[i].display = true;
                self.sprites[i].mc = self.sprites[i].mc_base;
            }
            if (enable & mask) == 0 {
                self.sprites[i].dma = false;
                self.sprites[i].display = false;
            }
            if (y_expand & mask) != 0 {
                self.sprites[i].exp_flop = !self.sprites[i].exp_flop;
            }
        }
    }

    fn vc_rc_logic(&mut self) {
        match self.raster_cycle {
            14 => {
                self.vc = self.vc_base;
                self.vmli = 0;
                if self.bad_line {
                    self.rc = 0;
                }
            }
            58 => {
                if self.rc == 7 {
                    self.vc_base = self.vc;
                }
                if self.bad_line || self.rc != 7 {
                    self.rc = (self.rc + 1) & 7;
                }
            }
            _ => {}
        }
        if (15..=54).contains(&self.raster_cycle) {
            self.vc += 1;
            self.vmli = (self.vmli + 1) % 40;
        }
    }

    fn ba_logic(&mut self) {
        let cpl = self.standard.cycles_per_line() as u16;
        let upcoming_bad_line_steal = self.bad_line && (12..15).contains(&self.raster_cycle + 3);
        let mut upcoming_sprite_steal = false;
        for i in 0..NUM_SPRITES {
            let p_cycle = (58 + 2 * i as u16) % cpl;
            if self.sprites[i].dma && (self.raster_cycle + 3) % cpl == p_cycle {
                upcoming_sprite_steal = true;
            }
        }
        let want_low = (self.bad_line && (11..=54).contains(&self.raster_cycle))
            || upcoming_bad_line_steal
            || upcoming_sprite_steal;
        self.ba_low = want_low;
    }

    fn draw_cycle<M: VicBus>(&mut self, mem: &mut M) {
        let cyc = self.raster_cycle;
        self.update_border_flipflops();

        if self.raster_line >= TEXTURE_SIZE as u16 {
            return;
        }
        let fb_y = self.raster_line as usize;
        let fb_x_base = (cyc as usize).wrapping_sub(1) * 8;
        if fb_x_base + 8 > TEXTURE_SIZE {
            return;
        }

        let border_color = self.palette[(self.regs[0x20] & 0x0F) as usize];
        let bg0 = self.palette[(self.regs[0x21] & 0x0F) as usize];
        let bg1 = self.palette[(self.regs[0x22] & 0x0F) as usize];
        let bg2 = self.palette[(self.regs[0x23] & 0x0F) as usize];
        let ecm_bg = self.palette[(self.regs[0x24] & 0x0F) as usize];

        let mut pixels = [border_color; 8];
        let mut fg_opaque = [false; 8];

        let display_col = if (15..=54).contains(&cyc) {
            Some((cyc - 15) as usize)
        } else {
            None
        };

        if !self.vertical_border {
            if let Some(col) = display_col {
                if self.bmm() {
                    self.render_bitmap(col, &mut pixels, &mut fg_opaque, mem, bg0);
                } else if self.ecm() {
                    self.render_ecm_text(col, &mut pixels, &mut fg_opaque, mem, ecm_bg, bg1, bg2);
                } else if self.mcm() {
                    self.render_mc_text(col, &mut pixels, &mut fg_opaque, mem, bg0, bg1, bg2);
                } else {
                    self.render_std_text(col, &mut pixels, &mut fg_opaque, mem, bg0);
                }
            }
        }

        self.composite_sprites(cyc, &mut pixels, &mut fg_opaque);

        if self.vertical_border || self.main_border {
            pixels = [border_color; 8];
        }

        for (i, p) in pixels.iter().enumerate() {
            let idx = (fb_y * TEXTURE_SIZE + fb_x_base + i) * 4;
            self.texture[idx] = p.0;
            self.texture[idx + 1] = p.1;
            self.texture[idx + 2] = p.2;
            self.texture[idx + 3] = 0xFF;
        }
    }

    fn update_border_flipflops(&mut self) {
        let csel = self.csel();
        let rsel = self.rsel();
        let x_left = if csel { 15u16 } else { 16 };
        let x_right = if csel { 55u16 } else { 54 };
        let y_top = if rsel { 0x33u16 } else { 0x37 };
        let y_bottom = if rsel { 0xFBu16 } else { 0xF7 };

        if self.raster_cycle == x_right {
            self.main_border = true;
        }
        if self.raster_line == y_bottom && self.raster_cycle == 63 {
            self.vertical_border = true;
        }
        if self.raster_cycle == x_left {
            if self.raster_line == y_top && self.den() {
                self.vertical_border = false;
            }
            if self.raster_cycle == x_left {
                self.main_border = false;
            }
        }
    }

    fn char_pixel_bit(&mut self, byte: u8, px: u8) -> u8 {
        (byte >> (7 - px)) & 1
    }

    fn render_std_text<M: VicBus>(
        &mut self,
        col: usize,
        pixels: &mut [(u8, u8, u8); 8],
        fg_opaque: &mut [bool; 8],
        mem: &mut M,
        bg0: (u8, u8, u8),
    ) {
        let code = self.video_matrix[col];
        let fg = self.palette[(self.color_line[col] & 0x0F) as usize];
        let addr = self.char_base() + (code as u16) * 8 + self.rc as u16;
        let byte = mem.vic_read(self.vic_bank, addr & 0x3FFF);
        for px in 0..8u8 {
            let bit = self.char_pixel_bit(byte, px);
            pixels[px as usize] = if bit != 0 { fg } else { bg0 };
            fg_opaque[px as usize] = bit != 0;
        }
    }

    fn render_mc_text<M: VicBus>(
        &mut self,
        col: usize,
        pixels: &mut [(u8, u8, u8); 8],
        fg_opaque: &mut [bool; 8],
        mem: &mut M,
        bg0: (u8, u8, u8),
        bg1: (u8, u8, u8),
        bg2: (u8, u8, u8),
    ) {
        let code = self.video_matrix[col];
        let color_nibble = self.color_line[col] & 0x0F;
        let addr = self.char_base() + (code as u16) * 8 + self.rc as u16;
        let byte = mem.vic_read(self.vic_bank, addr & 0x3FFF);
        if color_nibble & 0x08 == 0 {
            // High bit clear: behaves as standard hi-res using only 8 colors.
            self.render_std_text(col, pixels, fg_opaque, mem, bg0);
            return;
        }
        let fg = self.palette[(color_nibble & 0x07) as usize];
        for pair in 0..4 {
            let bits = (byte >> (6 - pair * 2)) & 0x03;
            let color = match bits {
                0 => bg0,
                1 => bg1,
                2 => bg2,
                _ => fg,
            };
            pixels[pair * 2] = color;
            pixels[pair * 2 + 1] = color;
            fg_opaque[pair * 2] = bits == 3;
            fg_opaque[pair * 2 + 1] = bits == 3;
        }
    }

    fn render_ecm_text<M: VicBus>(
        &mut self,
        col: usize,
        pixels: &mut [(u8, u8, u8); 8],
        fg_opaque: &mut [bool; 8],
        mem: &mut M,
        _ecm_bg: (u8, u8, u8),
        bg1: (u8, u8, u8),
        bg2: (u8, u8, u8),
    ) {
        let code = self.video_matrix[col];
        let fg = self.palette[(self.color_line[col] & 0x0F) as usize];
        // ECM uses only the low 6 bits of the char code for the glyph; the
        // top two bits select one of four background colors ($D021-$D024).
        let bg = match (code >> 6) & 0x03 {
            0 => self.palette[(self.regs[0x21] & 0x0F) as usize],
            1 => bg1,
            2 => bg2,
            _ => self.palette[(self.regs[0x24] & 0x0F) as usize],
        };
        let addr = self.char_base() + ((code & 0x3F) as u16) * 8 + self.rc as u16;
        let byte = mem.vic_read(self.vic_bank, addr & 0x3FFF);
        for px in 0..8u8 {
            let bit = self.char_pixel_bit(byte, px);
            pixels[px as usize] = if bit != 0 { fg } else { bg };
            fg_opaque[px as usize] = bit != 0;
        }
    }

    fn render_bitmap<M: VicBus>(
        &mut self,
        col: usize,
        pixels: &mut [(u8, u8, u8); 8],
        fg_opaque: &mut [bool; 8],
        mem: &mut M,
        bg0: (u8, u8, u8),
    ) {
        let bitmap_base = (((self.regs[0x18] >> 3) & 1) as u16) * 0x2000;
        let row_addr = bitmap_base + (col as u16) * 8 + self.rc as u16;
        let byte = mem.vic_read(self.vic_bank, row_addr & 0x3FFF);
        let screen_byte = self.video_matrix[col];

        if self.mcm() {
            let color_nibble = self.color_line[col] & 0x0F;
            let c01 = (screen_byte >> 4) & 0x0F;
            let c10 = screen_byte & 0x0F;
            let c11 = color_nibble;
            for pair in 0..4 {
                let bits = (byte >> (6 - pair * 2)) & 0x03;
                let color = match bits {
                    0 => bg0,
                    1 => self.palette[c01 as usize],
                    2 => self.palette[c10 as usize],
                    _ => self.palette[c11 as usize],
                };
                pixels[pair * 2] = color;
                pixels[pair * 2 + 1] = color;
                fg_opaque[pair * 2] = bits == 1 || bits == 2 || bits == 3;
                fg_opaque[pair * 2 + 1] = fg_opaque[pair * 2];
            }
        } else {
            let hi = self.palette[((screen_byte >> 4) & 0x0F) as usize];
            let lo = self.palette[(screen_byte & 0x0F) as usize];
            for px in 0..8u8 {
                let bit = self.char_pixel_bit(byte, px);
                pixels[px as usize] = if bit != 0 { hi } else { lo };
                fg_opaque[px as usize] = bit != 0;
            }
        }
    }

    fn composite_sprites(&mut self, cyc: u16, pixels: &mut [(u8, u8, u8); 8], fg_opaque: &mut [bool; 8]) {
        if !(15..=62).contains(&cyc) {
            return;
        }
        let mcm_mask = self.regs[0x1C];
        let priority_mask = self.regs[0x1B];
        let mc0 = self.palette[(self.regs[0x25] & 0x0F) as usize];
        let mc1 = self.palette[(self.regs[0x26] & 0x0F) as usize];

        let prev_sprite_sprite = self.collision_sprite_sprite;
        let prev_sprite_bg = self.collision_sprite_bg;
        // Which sprites already have an opaque pixel at each of this cycle's
        // 8 columns, independent of draw order or background priority.
        let mut sprite_hits = [0u8; 8];

        // Highest-priority sprite is sprite 0; later sprites draw over earlier
        // ones, matching real hardware's fixed priority order.
        for i in (0..NUM_SPRITES).rev() {
            if !self.sprites[i].display {
                continue;
            }
            let sx = self.sprite_x(i);
            let color = self.palette[(self.regs[0x27 + i] & 0x0F) as usize];
            let multicolor = mcm_mask & (1 << i) != 0;
            let behind_bg = priority_mask & (1 << i) != 0;

            for px in 0..8usize {
                let screen_x = (cyc.wrapping_sub(15)) * 8 + px as u16 + 0x18;
                if screen_x < sx || screen_x >= sx + 24 {
                    continue;
                }
                let bit_index = (screen_x - sx) as usize;
                if bit_index >= self.sprites[i].data.len() * 8 {
                    continue;
                }
                let byte = self.sprites[i].data[bit_index / 8];
                let bit = (byte >> (7 - (bit_index % 8))) & 1;
                if bit == 0 {
                    continue;
                }
                let this_pixel_idx = px;
                if this_pixel_idx >= 8 {
                    continue;
                }
                if sprite_hits[this_pixel_idx] != 0 {
                    self.collision_sprite_sprite |= sprite_hits[this_pixel_idx] | (1 << i);
                }
                sprite_hits[this_pixel_idx] |= 1 << i;
                if behind_bg && fg_opaque.get(this_pixel_idx).copied().unwrap_or(false) {
                    self.collision_sprite_bg |= 1 << i;
                    continue;
                }
                if fg_opaque.get(this_pixel_idx).copied().unwrap_or(false) {
                    self.collision_sprite_bg |= 1 << i;
                }
                let out = if multicolor {
                    match bit {
                        1 => mc0,
                        _ => mc1,
                    }
                } else {
                    color
                };
                pixels[this_pixel_idx] = out;
            }
        }

        if self.collision_sprite_sprite & !prev_sprite_sprite != 0 {
            self.irr |= IRR_SPRITE_SPRITE;
        }
        if self.collision_sprite_bg & !prev_sprite_bg != 0 {
            self.irr |= IRR_SPRITE_BG;
        }
    }

    fn sprite_x(&self, i: usize) -> u16 {
        let lo = self.regs[i * 2] as u16;
        let msb = self.regs[0x10] & (1 << i) != 0;
        if msb { lo | 0x100 } else { lo }
    }

    pub fn read_register(&mut self, reg: u8) -> u8 {
        match reg & 0x3F {
            0x11 => (self.regs[0x11] & 0x7F) | (((self.raster_line >> 8) as u8 & 1) << 7),
            0x12 => (self.raster_line & 0xFF) as u8,
            0x19 => {
                let any = if self.irr & self.imr & 0x0F != 0 { 0x80 } else { 0 };
                self.irr | any | 0x70
            }
            0x1A => self.imr | 0xF0,
            0x1E => {
                let v = self.collision_sprite_sprite;
                self.collision_sprite_sprite = 0;
                v
            }
            0x1F => {
                let v = self.collision_sprite_bg;
                self.collision_sprite_bg = 0;
                v
            }
            r if (r as usize) < self.regs.len() => self.regs[r as usize] | 0x00,
            _ => 0xFF,
        }
    }

    pub fn write_register(&mut self, reg: u8, value: u8) {
        let r = (reg & 0x3F) as usize;
        if r < self.regs.len() {
            self.regs[r] = value;
        }
        match reg & 0x3F {
            0x12 => self.raster_compare = (self.raster_compare & 0x100) | value as u16,
            0x11 => {
                self.raster_compare =
                    (self.raster_compare & 0xFF) | (((value & 0x80) as u16) << 1);
            }
            0x19 => self.irr &= !(value & 0x0F),
            0x1A => self.imr = value & 0x0F,
            _ => {}
        }
    }

    pub fn irq_line(&self) -> bool {
        self.irr & self.imr & 0x0F != 0
    }

    pub fn bank(&self) -> u8 {
        self.vic_bank
    }

    pub fn take_frame_complete(&mut self) -> bool {
        let v = self.frame_complete;
        self.frame_complete = false;
        v
    }

    pub fn texture(&self) -> &[u8] {
        self.texture.as_slice()
    }

    pub fn raster_line(&self) -> u16 {
        self.raster_line
    }

    pub fn raster_cycle(&self) -> u16 {
        self.raster_cycle
    }

    pub fn last_data_bus(&self) -> u8 {
        self.last_data_bus
    }
}
