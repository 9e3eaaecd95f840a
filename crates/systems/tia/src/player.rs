//! Player sprites (GRP0/GRP1)
//!
//! A player is drawn by a graphics scan counter rather than an enclockifier.
//! The scan counter walks the 8 bits of the graphics register from bit 7 down,
//! holding each bit for 1, 2 or 4 clocks. Double and quad width players start
//! one clock late.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::future::EventHandle;
use crate::sprite::{
    copies_glyph, copy_trigger, Motion, Notes, PlayerScan, Signals, Sprite, SpriteClock,
    SpriteCore, SpriteEvent, SpriteId,
};

/// Graphics scan counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanCounter {
    /// Bit being drawn, or -1 when idle
    pub pixel: i8,
    /// Clocks the current bit has been held for
    count: u8,
    /// Clocks left before a wide player starts drawing
    latch: u8,
    pub cpy: u8,
}

impl Default for ScanCounter {
    fn default() -> Self {
        Self {
            pixel: -1,
            count: 0,
            latch: 0,
            cpy: 0,
        }
    }
}

impl ScanCounter {
    fn start(&mut self, nusiz: u8) {
        if stretch(nusiz) > 1 {
            self.latch = 1;
        } else {
            self.pixel = 7;
            self.count = 0;
        }
    }

    fn tick(&mut self, nusiz: u8) {
        if self.latch > 0 {
            self.latch -= 1;
            if self.latch == 0 {
                self.pixel = 7;
                self.count = 0;
            }
            return;
        }

        if self.pixel >= 0 {
            self.count += 1;
            if self.count >= stretch(nusiz) {
                self.count = 0;
                self.pixel -= 1;
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.latch == 0 && self.pixel >= 0
    }

    /// %100 in the hardware's scan counter
    pub fn is_middle(&self) -> bool {
        self.latch == 0 && self.pixel == 3
    }
}

/// Clocks each graphics bit is held for
fn stretch(nusiz: u8) -> u8 {
    match nusiz & 0x07 {
        0x05 => 2,
        0x07 => 4,
        _ => 1,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub core: SpriteCore,
    pub scan: ScanCounter,

    pub color: u8,
    /// NUSIZx bits 0-2, which for players covers both copies and size
    pub nusiz: u8,
    pub reflected: bool,
    pub vertical_delay: bool,

    pub gfx_new: u8,
    /// Copy of gfx_new taken when the other player's GRPx is written
    pub gfx_old: u8,
}

impl Player {
    pub fn new(num: usize) -> Self {
        let id = if num == 0 {
            SpriteId::Player0
        } else {
            SpriteId::Player1
        };

        Self {
            core: SpriteCore::new(id),
            scan: ScanCounter::default(),
            color: 0,
            nusiz: 0,
            reflected: false,
            vertical_delay: false,
            gfx_new: 0,
            gfx_old: 0,
        }
    }

    pub fn set_nusiz(&mut self, value: u8) {
        self.nusiz = value & 0x07;
    }

    pub fn set_color(&mut self, value: u8) {
        self.color = value;
    }

    /// REFPx
    pub fn set_reflection(&mut self, value: u8) {
        self.reflected = value & 0x08 == 0x08;
    }

    /// VDELPx
    pub fn set_vertical_delay(&mut self, value: u8) {
        self.vertical_delay = value & 0x01 == 0x01;
    }

    /// GRPx
    pub fn set_gfx_data(&mut self, value: u8) {
        self.gfx_new = value;
    }

    /// The other player's GRPx was written
    pub fn latch_old_gfx(&mut self) {
        self.gfx_old = self.gfx_new;
    }

    /// What a missile's reset-to-player wire sees
    pub fn scan_state(&self) -> PlayerScan {
        PlayerScan {
            cpy: self.scan.cpy,
            middle: self.scan.is_middle(),
        }
    }
}

impl Sprite for Player {
    fn core(&self) -> &SpriteCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SpriteCore {
        &mut self.core
    }

    fn tick(&mut self, clk: SpriteClock, sig: &Signals) {
        let counted = match self.core.motion(clk) {
            Motion::Skipped => return,
            Motion::Clocked => None,
            Motion::Counted(count) => Some(count),
        };

        if let Some(cpy) = counted.and_then(|count| copy_trigger(count, self.nusiz)) {
            if self.core.start_condition() {
                self.core.schedule_start(cpy);
            }
        }

        // the scan counter shares the motion clock
        self.scan.tick(self.nusiz);

        self.run_delay(sig);
    }

    fn pixel(&self) -> (bool, u8) {
        if !self.scan.is_active() {
            return (false, self.color);
        }

        let mut gfx = if self.vertical_delay {
            self.gfx_old
        } else {
            self.gfx_new
        };
        if self.reflected {
            gfx = gfx.reverse_bits();
        }

        ((gfx >> self.scan.pixel) & 0x01 == 0x01, self.color)
    }

    fn reset_position(&mut self, sig: &Signals) {
        // a start that is due next tick goes ahead regardless
        if !self.core.start_about_to_end() {
            self.core.pause_start();
        }
        self.core.schedule_reset(sig);
    }

    fn on_event(&mut self, handle: EventHandle, ev: SpriteEvent, sig: &Signals) {
        match ev {
            SpriteEvent::Hmove(value) => self.core.apply_hmove(value),
            SpriteEvent::StartDrawing { cpy } => {
                self.core.start_fired(handle);
                self.scan.start(self.nusiz);
                self.scan.cpy = cpy;
            }
            SpriteEvent::ResetPosition => {
                self.core.fire_reset(sig.tv_horiz_pos);
                if let Some((h, ev)) = self.core.take_start() {
                    self.on_event(h, ev, sig);
                }
            }
            SpriteEvent::Enclock(_) => {}
        }
    }

    fn reset(&mut self) {
        self.core.reset();
        self.scan = ScanCounter::default();
        self.color = 0;
        self.nusiz = 0;
        self.reflected = false;
        self.vertical_delay = false;
        self.gfx_new = 0;
        self.gfx_old = 0;
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.write_motion(f)?;
        write!(f, "{}", copies_glyph(self.nusiz))?;

        let mut notes = Notes::new(f);
        match self.nusiz {
            0x05 => notes.tag("2x")?,
            0x07 => notes.tag("4x")?,
            _ => {}
        }
        if self.core.more_hmove {
            notes.tag("hmoving")?;
            notes.tag(&format!("[{:04b}]", self.core.hmove))?;
        }
        if self.scan.is_active() {
            let which = match self.scan.cpy {
                0 => "1st",
                1 => "2nd",
                _ => "3rd",
            };
            notes.note(format_args!("drw {} [{}]", which, self.scan.pixel))?;
        }
        if self.reflected {
            notes.note(format_args!("refl"))?;
        }
        if self.vertical_delay {
            notes.note(format_args!("vdel"))?;
        }
        Ok(())
    }
}
