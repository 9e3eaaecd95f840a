//! Missile sprites (ENAM0/ENAM1)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enclockifier::Enclockifier;
use crate::future::EventHandle;
use crate::sprite::{
    copies_glyph, copy_trigger, Motion, Notes, Signals, Sprite, SpriteClock, SpriteCore,
    SpriteEvent, SpriteId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Missile {
    pub core: SpriteCore,
    pub enclockifier: Enclockifier,

    pub enabled: bool,
    pub color: u8,
    /// NUSIZx bits 4-5
    pub size: u8,
    /// NUSIZx bits 0-2
    pub copies: u8,

    /// RESMPx latch
    pub reset_to_player: bool,
    /// Index of the player whose scan counter drives the reset-to-player wire
    pub parent: usize,
}

impl Missile {
    pub fn new(num: usize) -> Self {
        let id = if num == 0 {
            SpriteId::Missile0
        } else {
            SpriteId::Missile1
        };

        Self {
            core: SpriteCore::new(id),
            enclockifier: Enclockifier::new(),
            enabled: false,
            color: 0,
            size: 0,
            copies: 0,
            reset_to_player: false,
            parent: num,
        }
    }

    pub fn set_nusiz(&mut self, value: u8) {
        self.size = (value & 0x30) >> 4;
        self.copies = value & 0x07;
    }

    pub fn set_color(&mut self, value: u8) {
        self.color = value;
    }

    /// ENAMx
    pub fn set_enable(&mut self, value: u8) {
        self.enabled = value & 0x02 == 0x02;
    }

    /// RESMPx
    pub fn set_reset_to_player(&mut self, value: u8) {
        self.reset_to_player = value & 0x02 == 0x02;
    }
}

impl Sprite for Missile {
    fn core(&self) -> &SpriteCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SpriteCore {
        &mut self.core
    }

    fn tick(&mut self, clk: SpriteClock, sig: &Signals) {
        // the missile counter is held in reset while the parent player is
        // halfway through drawing its primary copy
        if self.reset_to_player {
            let parent = sig.players[self.parent];
            if parent.cpy == 0 && parent.middle {
                self.core.position.reset();
                self.core.pclk.reset();
            }
        }

        let counted = match self.core.motion(clk) {
            Motion::Skipped => return,
            Motion::Clocked => None,
            Motion::Counted(count) => Some(count),
        };

        if let Some(cpy) = counted.and_then(|count| copy_trigger(count, self.copies)) {
            if self.core.start_condition() {
                self.core.schedule_start(cpy);
            }
        }

        self.run_delay(sig);
    }

    fn pixel(&self) -> (bool, u8) {
        // An HMOVE clock landing just before a START makes the missile start
        // one clock early. This is what draws the Cosmic Ark starfield.
        let early_start = self.core.stuffed_tick && self.core.start_about_to_end();

        let px = !self.reset_to_player && (self.enclockifier.enable || early_start);
        (self.enabled && px, self.color)
    }

    fn reset_position(&mut self, sig: &Signals) {
        // drawing resumes when the reset resolves
        self.enclockifier.pause(&mut self.core.delay);
        self.core.pause_start();
        self.core.schedule_reset(sig);
    }

    fn on_event(&mut self, handle: EventHandle, ev: SpriteEvent, sig: &Signals) {
        match ev {
            SpriteEvent::Hmove(value) => self.core.apply_hmove(value),
            SpriteEvent::StartDrawing { cpy } => {
                self.core.start_fired(handle);
                self.enclockifier.start(self.size, &mut self.core.delay);
                self.enclockifier.cpy = cpy;
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
            }
        }
    }

    fn reset(&mut self) {
        self.core.reset();
        self.enclockifier.reset();
        self.enabled = false;
        self.color = 0;
        self.size = 0;
        self.copies = 0;
        self.reset_to_player = false;
    }
}

impl fmt::Display for Missile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.write_motion(f)?;
        write!(f, "{}", copies_glyph(self.copies))?;

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
            notes.note(format_args!("drw {}", self.enclockifier))?;
        }
        if !self.enabled {
            notes.note(format_args!("disb"))?;
        }
        if self.reset_to_player {
            notes.note(format_args!(">pl<"))?;
        }
        Ok(())
    }
}
