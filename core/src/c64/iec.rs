//! The IEC serial bus: three wire-AND lines (ATN, CLOCK, DATA) shared by
//! the C64 and every attached drive. Grounded on
//! `examples/original_source/Emulator/Computer/IEC.cpp`'s lazy
//! `updateIecLinesC64`/`updateIecLinesDrive` re-evaluation and the
//! "auto-acknowledge" behavior where a drive's VIA pulls DATA low for one
//! cycle after an ATN transition if its ATN-acknowledge bit is set.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IecLines {
    pub atn: bool,
    pub clock: bool,
    pub data: bool,
}

/// One side's (C64's or a drive's) contribution to the three lines.
/// `true` means "driving the line low" (active), matching the real bus's
/// open-collector wired-AND behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IecContribution {
    pub atn: bool,
    pub clock: bool,
    pub data: bool,
}

const IDLE_TIMEOUT: u32 = 30;

pub struct IecBus {
    c64: IecContribution,
    drives: [IecContribution; 2],
    lines: IecLines,
    dirty: bool,
    prev_atn: bool,
    idle_counter: u32,
    busy: bool,
}

impl IecBus {
    pub fn new() -> Self {
        Self {
            c64: IecContribution::default(),
            drives: [IecContribution::default(); 2],
            lines: IecLines { atn: true, clock: true, data: true },
            dirty: false,
            prev_atn: true,
            idle_counter: IDLE_TIMEOUT,
            busy: false,
        }
    }

    pub fn set_c64_contribution(&mut self, c: IecContribution) {
        if c != self.c64 {
            self.c64 = c;
            self.dirty = true;
        }
    }

    pub fn set_drive_contribution(&mut self, drive: usize, c: IecContribution) {
        if self.drives[drive] != c {
            self.drives[drive] = c;
            self.dirty = true;
        }
    }

    pub fn lines(&self) -> IecLines {
        self.lines
    }

    /// Re-evaluate the wire-AND if any contribution changed since the last
    /// call. Returns `(atn_transitioned, went_idle)`.
    pub fn tick(&mut self) -> (bool, bool) {
        let mut atn_edge = false;
        if self.dirty {
            let atn_driven = self.c64.atn || self.drives[0].atn || self.drives[1].atn;
            let clock_driven = self.c64.clock || self.drives[0].clock || self.drives[1].clock;
            let data_driven = self.c64.data || self.drives[0].data || self.drives[1].data;
            let new_lines = IecLines {
                atn: !atn_driven,
                clock: !clock_driven,
                data: !data_driven,
            };
            if new_lines != self.lines {
                self.lines = new_lines;
                self.idle_counter = IDLE_TIMEOUT;
                self.busy = true;
            }
            self.dirty = false;
        }

        if self.lines.atn != self.prev_atn {
            atn_edge = true;
        }
        self.prev_atn = self.lines.atn;

        let mut went_idle = false;
        if self.idle_counter > 0 {
            self.idle_counter -= 1;
            if self.idle_counter == 0 {
                self.busy = false;
                went_idle = true;
            }
        }
        (atn_edge, went_idle)
    }

    pub fn is_idle(&self) -> bool {
        !self.busy
    }

    pub fn save_state(&self, w: &mut crate::c64::snapshot::SnapshotWriter) {
        w.bool(self.c64.atn);
        w.bool(self.c64.clock);
        w.bool(self.c64.data);
        for d in &self.drives {
            w.bool(d.atn);
            w.bool(d.clock);
            w.bool(d.data);
        }
        w.bool(self.lines.atn);
        w.bool(self.lines.clock);
        w.bool(self.lines.data);
        w.bool(self.dirty);
        w.bool(self.prev_atn);
        w.u32(self.idle_counter);
        w.bool(self.busy);
    }

    pub fn load_state(
        &mut self,
        r: &mut crate::c64::snapshot::SnapshotReader,
    ) -> Result<(), crate::c64::snapshot::SnapshotError> {
        self.c64 = IecContribution { atn: r.bool()?, clock: r.bool()?, data: r.bool()? };
        for d in &mut self.drives {
            *d = IecContribution { atn: r.bool()?, clock: r.bool()?, data: r.bool()? };
        }
        self.lines = IecLines { atn: r.bool()?, clock: r.bool()?, data: r.bool()? };
        self.dirty = r.bool()?;
        self.prev_atn = r.bool()?;
        self.idle_counter = r.u32()?;
        self.busy = r.bool()?;
        Ok(())
    }
}

impl Default for IecBus {
    fn default() -> Self {
        Self::new()
    }
}
