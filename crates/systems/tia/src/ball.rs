//! Ball sprite (ENABL)
//!
//! Positioned like the missiles but with no copies. Its size comes from CTRLPF
//! and its color from COLUPF, both shared with the playfield.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enclockifier::Enclockifier;
use crate::future::EventHandle;
use crate::sprite::{
    Motion, Notes, Signals, Sprite, SpriteClock, SpriteCore, SpriteEvent, SpriteId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub core: SpriteCore,
    pub enclockifier: Enclockifier,

    pub enabled: bool,
    /// Copy of `enabled` taken when GRP1 is written
    pub enabled_delay: bool,
    pub vertical_delay: bool,
    pub color: u8,
    /// CTRLPF bits 4-5
    pub size: u8,
}

impl Default for Ball {
    fn default() -> Self {
        Self::new()
    }
}

impl Ball {
    pub fn new() -> Self {
        Self {
            core: SpriteCore::new(SpriteId::Ball),
            enclockifier: Enclockifier::new(),
            enabled: false,
            enabled_delay: false,
            vertical_delay: false,
            color: 0,
            size: 0,
        }
    }

    /// ENABL
    pub fn set_enable(&mut self, value: u8) {
        self.enabled = value & 0x02 == 0x02;
    }

    /// VDELBL
    pub fn set_vertical_delay(&mut self, value: u8) {
        self.vertical_delay = value & 0x01 == 0x01;
    }

    /// GRP1 was written
    pub fn latch_enable_delay(&mut self) {
        self.enabled_delay = self.enabled;
    }

    pub fn set_size(&mut self, size: u8) {
        self.size = size & 0x03;
    }

    pub fn set_color(&mut self, value: u8) {
        self.color = value;
    }
}

impl Sprite for Ball {
    fn core(&self) -> &SpriteCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SpriteCore {
        &mut self.core
    }

    fn tick(&mut self, clk: SpriteClock, sig: &Signals) {
        match self.core.motion(clk) {
            Motion::Skipped => return,
            Motion::Counted(39) => {
                if self.core.start_condition() {
                    self.core.schedule_start(0);
                }
            }
            _ => {}
        }

        self.run_delay(sig);
    }

    fn pixel(&self) -> (bool, u8) {
        let enabled = if self.vertical_delay {
            self.enabled_delay
        } else {
            self.enabled
        };

        // see the missile for the stuffed tick case
        let early_start = self.core.stuffed_tick && self.core.start_about_to_end();

        (enabled && (self.enclockifier.enable || early_start), self.color)
    }

    fn reset_position(&mut self, sig: &Signals) {
        self.enclockifier.pause(&mut self.core.delay);
        self.core.pause_start();
        self.core.schedule_reset(sig);
    }

    fn on_event(&mut self, handle: EventHandle, ev: SpriteEvent, sig: &Signals) {
        match ev {
            SpriteEvent::Hmove(value) => self.core.apply_hmove(value),
            SpriteEvent::StartDrawing { .. } => {
                self.core.start_fired(handle);
                self.enclockifier.start(self.size, &mut self.core.delay);
            }
            SpriteEvent::Enclock(ev) => {
                self.enclockifier.fired(handle, ev, &mut self.core.delay);
            }
            SpriteEvent::ResetPosition => {
                self.core.fire_reset(sig.tv_horiz_pos);
                self.enclockifier.force(&mut self.core.delay);
                if let Some((h, ev)) = self.core.take_start() {
                    self.on_event(h, ev, sig);
                }

                // unlike the missiles the ball always begins a new run
                self.core.schedule_start(0);
            }
        }
    }

    fn reset(&mut self) {
        self.core.reset();
        self.enclockifier.reset();
        self.enabled = false;
        self.enabled_delay = false;
        self.vertical_delay = false;
        self.color = 0;
        self.size = 0;
    }
}

impl fmt::Display for Ball {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.write_motion(f)?;
        write!(f, "|")?;

        let mut notes = Notes::new(f);
        match self.size {
            0x01 => notes.tag("2x")?,
            0x02 => notes.tag("4x")?,
            0x03 => notes.tag("8x")?,
            _ => {}
        }
        if self.core.more_hmove {
            notes.tag("hmoving")?;
            notes.tag(&format!("[{:04b}]", self.core.hmove))?;
        }
        if self.enclockifier.enable {
            notes.note(format_args!("drw"))?;
        }
        if !self.enabled {
            notes.note(format_args!("disb"))?;
        }
        if self.vertical_delay {
            notes.note(format_args!("vdel"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motck() -> SpriteClock {
        SpriteClock {
            motck: true,
            hmove: false,
            hmove_count: 0,
        }
    }

    #[test]
    fn test_draws_four_ticks_after_reset() {
        let mut b = Ball::new();
        let sig = Signals::default();
        b.set_enable(0x02);
        b.reset_position(&sig);

        // reset fires on the fifth tick
        for _ in 0..5 {
            assert!(!b.pixel().0);
            b.tick(motck(), &sig);
        }
        assert!(b.core.reset_event.is_none());

        for _ in 0..3 {
            b.tick(motck(), &sig);
            assert!(!b.pixel().0);
        }
        b.tick(motck(), &sig);
        assert!(b.pixel().0);

        // one clock wide
        b.tick(motck(), &sig);
        assert!(!b.pixel().0);
    }

    #[test]
    fn test_vertical_delay() {
        let mut b = Ball::new();
        b.enclockifier.enable = true;
        b.set_vertical_delay(0x01);
        b.set_enable(0x02);
        assert!(!b.pixel().0);

        b.latch_enable_delay();
        assert!(b.pixel().0);

        b.set_enable(0x00);
        assert!(b.pixel().0);
    }

    #[test]
    fn test_redraws_every_scanline() {
        let mut b = Ball::new();
        let sig = Signals::default();
        b.set_enable(0x02);
        b.set_size(0x03);

        let mut drawn = Vec::new();
        for i in 0..330 {
            b.tick(motck(), &sig);
            if b.pixel().0 {
                drawn.push(i);
            }
        }
        assert_eq!(drawn.len(), 16);
        assert_eq!(drawn[8] - drawn[0], 160);
    }

    #[test]
    fn test_machine_info() {
        let mut b = Ball::new();
        b.set_size(2);
        b.set_vertical_delay(0x01);
        assert_eq!(
            b.to_string(),
            "Ball: 00 _*-- [000 > 0x0 > 000] | 4x, disb, vdel"
        );
    }
}
