//! Motion and timing shared by every sprite
//!
//! Players, missiles and the ball all position themselves the same way: a
//! phase clock divides the motion clock by four and a position counter counts
//! the Phi2 edges. Drawing starts when the counter passes one of the trigger
//! values for the sprite's copies setting. Register writes that move the
//! sprite take effect through its delay queue.
//!
//! The delays are empirical and have to match the silicon exactly:
//!
//! | effect                              | delay |
//! |-------------------------------------|-------|
//! | RESxx while the beam is visible     | 4     |
//! | RESxx during HBLANK, HMOVE latched  | 3     |
//! | RESxx during HBLANK                 | 2     |
//! | START of a drawing run              | 4     |
//! | HMxx / HMCLR value                  | 1     |

use std::fmt;

use serde::{Deserialize, Serialize};
use vcs_core::config::{CLOCKS_PER_VISIBLE, HMOVE_EXTRA_HBLANK};
use vcs_core::logging::{log, LogCategory, LogLevel};

use crate::enclockifier::EnclockEvent;
use crate::future::{EventHandle, Scheduler};
use crate::phaseclock::{Edge, PhaseClock};
use crate::polycounter::Polycounter;

pub const START_DELAY: u32 = 4;
pub const HMOVE_VALUE_DELAY: u32 = 1;

/// Internal hmove value at power on. Same as writing 0 to HMxx.
pub const POWER_ON_HMOVE: u8 = 8;

/// hmovedPixel given to a sprite reset while the beam is off screen
pub const OFFSCREEN_HMOVED_PIXEL: i32 = 7;

const VISIBLE: i32 = CLOCKS_PER_VISIBLE as i32;

/// Delay between a RESxx write and the position reset
pub fn reset_delay(hblank: bool, hmove_latch: bool) -> u32 {
    match (hblank, hmove_latch) {
        (false, _) => 4,
        (true, true) => 3,
        (true, false) => 2,
    }
}

/// True while a sprite with the given hmove value still wants clocks at this
/// point of the HMOVE ripple. The ripple counts down from 15, so a sprite
/// receives exactly `hmove` extra clocks.
pub fn compare_hmove(ripple: u8, hmove: u8) -> bool {
    (ripple ^ 0x0f) != hmove
}

/// Copy number to start drawing when the position counter reaches `count`, for
/// the low three bits of NUSIZx
pub fn copy_trigger(count: u8, copies: u8) -> Option<u8> {
    match count {
        3 if matches!(copies, 0x01 | 0x03) => Some(1),
        7 if matches!(copies, 0x02 | 0x03 | 0x06) => Some(if copies == 0x03 { 2 } else { 1 }),
        15 if matches!(copies, 0x04 | 0x06) => Some(if copies == 0x06 { 2 } else { 1 }),
        39 => Some(0),
        _ => None,
    }
}

/// Everything a sprite can have waiting in its delay queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteEvent {
    /// Latch the raw HMxx value
    Hmove(u8),
    ResetPosition,
    StartDrawing { cpy: u8 },
    Enclock(EnclockEvent),
}

impl From<EnclockEvent> for SpriteEvent {
    fn from(ev: EnclockEvent) -> Self {
        SpriteEvent::Enclock(ev)
    }
}

/// Clock inputs for one color clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpriteClock {
    /// Motion clock, running while the beam is visible
    pub motck: bool,
    /// An HMOVE stuffing pulse is on this clock
    pub hmove: bool,
    /// Ripple counter value for the pulse
    pub hmove_count: u8,
}

/// What a missile sees of its parent player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerScan {
    pub cpy: u8,
    /// Scan counter is halfway through the graphics
    pub middle: bool,
}

/// Chip-wide signals, read only by the sprites
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub hblank: bool,
    pub hmove_latch: bool,
    /// Column the television last drew, negative during HBLANK
    pub tv_horiz_pos: i32,
    pub players: [PlayerScan; 2],
}

/// Outcome of offering a color clock to a sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// Neither the motion clock nor an HMOVE pulse reached the sprite
    Skipped,
    Clocked,
    /// Clocked on Phi2; the position counter now reads this
    Counted(u8),
}

/// Register names used to label delay queue entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteNames {
    pub label: &'static str,
    pub reset: &'static str,
    pub hmove: &'static str,
}

/// Which of the five sprites a `SpriteCore` belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteId {
    Player0,
    Player1,
    Missile0,
    Missile1,
    Ball,
}

impl SpriteId {
    pub fn names(self) -> SpriteNames {
        let (label, reset, hmove) = match self {
            SpriteId::Player0 => ("Player 0", "RESP0", "HMP0"),
            SpriteId::Player1 => ("Player 1", "RESP1", "HMP1"),
            SpriteId::Missile0 => ("Missile 0", "RESM0", "HMM0"),
            SpriteId::Missile1 => ("Missile 1", "RESM1", "HMM1"),
            SpriteId::Ball => ("Ball", "RESBL", "HMBL"),
        };
        SpriteNames {
            label,
            reset,
            hmove,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteCore {
    pub id: SpriteId,

    pub position: Polycounter,
    pub pclk: PhaseClock,
    pub delay: Scheduler<SpriteEvent>,

    pub more_hmove: bool,
    pub hmove: u8,

    // presentation only, never used for drawing
    pub reset_pixel: i32,
    pub hmoved_pixel: i32,

    /// Last applied tick came from an HMOVE pulse
    pub stuffed_tick: bool,

    pub reset_event: Option<EventHandle>,
    pub start_event: Option<EventHandle>,
    /// Pending HMxx/HMCLR value. There is one latch, so later writes replace it.
    pub hmove_event: Option<EventHandle>,

    /// The pending reset replaced one that never resolved (a quick double
    /// write such as INC RESM0)
    pub reset_restart: bool,
}

impl SpriteCore {
    pub fn new(id: SpriteId) -> Self {
        Self {
            id,
            position: Polycounter::new(),
            pclk: PhaseClock::default(),
            delay: Scheduler::new(id.names().label),
            more_hmove: false,
            hmove: POWER_ON_HMOVE,
            reset_pixel: 0,
            hmoved_pixel: 0,
            stuffed_tick: false,
            reset_event: None,
            start_event: None,
            hmove_event: None,
            reset_restart: false,
        }
    }

    /// Back to power-on state
    pub fn reset(&mut self) {
        *self = Self::new(self.id);
    }

    pub fn names(&self) -> SpriteNames {
        self.id.names()
    }

    pub fn label(&self) -> &'static str {
        self.names().label
    }

    /// Offer one color clock. Applies it to the phase clock and position
    /// counter if either the motion clock or an HMOVE pulse is for us.
    pub fn motion(&mut self, clk: SpriteClock) -> Motion {
        if clk.hmove {
            self.more_hmove = self.more_hmove && compare_hmove(clk.hmove_count, self.hmove);
        }

        let stuffed = clk.hmove && self.more_hmove;
        if !clk.motck && !stuffed {
            return Motion::Skipped;
        }

        if !clk.motck {
            self.hmoved_pixel -= 1;
            if self.hmoved_pixel < 0 {
                self.hmoved_pixel += VISIBLE;
            }
        }

        self.stuffed_tick = stuffed;

        match self.pclk.tick() {
            Some(Edge::Phi2) => Motion::Counted(self.position.tick()),
            _ => Motion::Clocked,
        }
    }

    /// A new drawing run may start unless a reset is part way through
    pub fn start_condition(&self) -> bool {
        match self.reset_event {
            None => true,
            Some(h) => self.delay.just_started(h) && !self.reset_restart,
        }
    }

    pub fn schedule_start(&mut self, cpy: u8) {
        let h = self
            .delay
            .schedule(START_DELAY, SpriteEvent::StartDrawing { cpy }, "START");
        self.start_event = Some(h);
    }

    /// Bookkeeping for a START event that has just fired
    pub fn start_fired(&mut self, handle: EventHandle) {
        if self.start_event == Some(handle) {
            self.start_event = None;
        }
    }

    pub fn pause_start(&mut self) {
        if let Some(h) = self.start_event {
            self.delay.pause(h);
        }
    }

    /// Pull the pending START out of the queue so it can be applied now
    pub fn take_start(&mut self) -> Option<(EventHandle, SpriteEvent)> {
        let h = self.start_event.take()?;
        self.delay.force(h).map(|ev| (h, ev))
    }

    /// The start is due on the next tick
    pub fn start_about_to_end(&self) -> bool {
        self.start_event
            .map(|h| self.delay.about_to_end(h))
            .unwrap_or(false)
    }

    /// Queue a position reset, superseding any that is still pending
    pub fn schedule_reset(&mut self, sig: &Signals) {
        let delay = reset_delay(sig.hblank, sig.hmove_latch);

        if let Some(h) = self.reset_event.take() {
            self.delay.drop(h);
            self.reset_restart = true;
            log(LogCategory::Video, LogLevel::Debug, || {
                let names = self.names();
                format!("{}: {} restarted before resolving", names.label, names.reset)
            });
        } else {
            self.reset_restart = false;
        }

        let h = self
            .delay
            .schedule(delay, SpriteEvent::ResetPosition, self.names().reset);
        self.reset_event = Some(h);
    }

    /// Position reset has fired. Sprite specific forcing is left to the caller.
    pub fn fire_reset(&mut self, tv_horiz_pos: i32) {
        self.reset_pixel = tv_horiz_pos;

        if self.reset_pixel >= 0 {
            // the television is one clock behind at this point
            self.reset_pixel += 1;
            if self.reset_pixel > VISIBLE {
                self.reset_pixel -= VISIBLE;
            }
            self.hmoved_pixel = self.reset_pixel;
        } else {
            self.reset_pixel = 0;
            self.hmoved_pixel = OFFSCREEN_HMOVED_PIXEL;
        }

        self.position.reset();
        self.pclk.reset();
        self.reset_event = None;

        log(LogCategory::Video, LogLevel::Trace, || {
            format!("{}: reset at pixel {}", self.label(), self.reset_pixel)
        });
    }

    pub fn schedule_hmove(&mut self, value: u8, clearing: bool) {
        let label = if clearing { "HMCLR" } else { self.names().hmove };
        let ev = SpriteEvent::Hmove(value);

        if let Some(h) = self.hmove_event {
            if self.delay.replace(h, ev, label) {
                return;
            }
        }
        self.hmove_event = Some(self.delay.schedule(HMOVE_VALUE_DELAY, ev, label));
    }

    pub fn apply_hmove(&mut self, value: u8) {
        self.hmove_event = None;
        self.hmove = (value ^ 0x80) >> 4;
    }

    pub fn prepare_for_hmove(&mut self, hblank: bool) {
        self.more_hmove = true;

        if hblank {
            // keeps changing while more_hmove is set
            self.hmoved_pixel += HMOVE_EXTRA_HBLANK as i32;
            if self.hmoved_pixel > VISIBLE {
                self.hmoved_pixel -= VISIBLE;
            }
        }
    }

    pub fn rsync(&mut self, adjustment: i32) {
        self.reset_pixel = (self.reset_pixel - adjustment).rem_euclid(VISIBLE);
        self.hmoved_pixel = (self.hmoved_pixel - adjustment).rem_euclid(VISIBLE);
    }

    /// hmove as the programmer wrote it, 0..=15 with 8 meaning no movement
    pub fn normalised_hmove(&self) -> u8 {
        self.hmove.wrapping_sub(8) & 0x0f
    }

    /// Common head of every sprite's machine info
    pub fn write_motion(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} [{:03} > {:#x} > {:03}",
            self.label(),
            self.position,
            self.pclk,
            self.reset_pixel,
            self.normalised_hmove(),
            self.hmoved_pixel
        )?;
        if self.more_hmove {
            write!(f, "*] ")
        } else {
            write!(f, "] ")
        }
    }
}

/// Diagnostic notes appended after a sprite's motion summary, separated with
/// commas
pub(crate) struct Notes<'a, 'b> {
    f: &'a mut fmt::Formatter<'b>,
    any: bool,
}

impl<'a, 'b> Notes<'a, 'b> {
    pub(crate) fn new(f: &'a mut fmt::Formatter<'b>) -> Self {
        Self { f, any: false }
    }

    /// A note that sits straight after the previous one (sizes)
    pub(crate) fn tag(&mut self, s: &str) -> fmt::Result {
        self.any = true;
        write!(self.f, " {}", s)
    }

    pub(crate) fn note(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        if self.any {
            write!(self.f, ",")?;
        }
        self.any = true;
        write!(self.f, " {}", args)
    }
}

/// Glyph for the copies field of NUSIZx
pub fn copies_glyph(copies: u8) -> &'static str {
    match copies & 0x07 {
        0x01 => "|_|",
        0x02 => "|__|",
        0x03 => "|_|_|",
        0x04 => "|___|",
        0x06 => "|__|__|",
        _ => "|",
    }
}

/// What the compositor needs from every sprite
pub trait Sprite {
    fn core(&self) -> &SpriteCore;
    fn core_mut(&mut self) -> &mut SpriteCore;

    /// One color clock
    fn tick(&mut self, clk: SpriteClock, sig: &Signals);

    /// Whether the sprite is drawing on this clock, and its color
    fn pixel(&self) -> (bool, u8);

    /// RESxx strobe
    fn reset_position(&mut self, sig: &Signals);

    /// Apply an event fired from the delay queue
    fn on_event(&mut self, handle: EventHandle, ev: SpriteEvent, sig: &Signals);

    /// Back to power-on state, in place
    fn reset(&mut self);

    /// Count down the delay queue, applying whatever fires
    fn run_delay(&mut self, sig: &Signals) {
        self.core_mut().delay.tick();
        while let Some((h, ev)) = self.core_mut().delay.next_fired() {
            self.on_event(h, ev, sig);
        }
    }

    /// HMxx write, or HMCLR when `clearing`
    fn set_hmove_value(&mut self, value: u8, clearing: bool) {
        self.core_mut().schedule_hmove(value, clearing);
    }

    fn prepare_for_hmove(&mut self, hblank: bool) {
        self.core_mut().prepare_for_hmove(hblank);
    }

    fn rsync(&mut self, adjustment: i32) {
        self.core_mut().rsync(adjustment);
    }

    fn label(&self) -> &'static str {
        self.core().label()
    }

    fn reset_pixel(&self) -> i32 {
        self.core().reset_pixel
    }

    fn hmoved_pixel(&self) -> i32 {
        self.core().hmoved_pixel
    }

    fn more_hmove(&self) -> bool {
        self.core().more_hmove
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::future::MAX_PENDING;

    #[test]
    fn test_reset_delays() {
        assert_eq!(reset_delay(false, false), 4);
        assert_eq!(reset_delay(false, true), 4);
        assert_eq!(reset_delay(true, true), 3);
        assert_eq!(reset_delay(true, false), 2);
    }

    #[test]
    fn test_copy_triggers() {
        assert_eq!(copy_trigger(3, 0x01), Some(1));
        assert_eq!(copy_trigger(3, 0x02), None);
        assert_eq!(copy_trigger(7, 0x03), Some(2));
        assert_eq!(copy_trigger(7, 0x02), Some(1));
        assert_eq!(copy_trigger(15, 0x06), Some(2));
        assert_eq!(copy_trigger(15, 0x04), Some(1));
        // double and quad width players have no copies
        for count in [3, 7, 15] {
            assert_eq!(copy_trigger(count, 0x05), None);
            assert_eq!(copy_trigger(count, 0x07), None);
        }
        for copies in 0..8 {
            assert_eq!(copy_trigger(39, copies), Some(0));
        }
    }

    #[test]
    fn test_hmove_value_latch() {
        let mut core = SpriteCore::new(SpriteId::Missile0);
        assert_eq!(core.normalised_hmove(), 0);

        core.apply_hmove(0x70); // 7 left
        assert_eq!(core.hmove, 15);
        core.apply_hmove(0x80); // 8 right
        assert_eq!(core.hmove, 0);
        core.apply_hmove(0xf0); // 1 right
        assert_eq!(core.hmove, 7);
        assert_eq!(core.normalised_hmove(), 0x0f);
    }

    #[test]
    fn test_hmove_gives_exactly_hmove_clocks() {
        for hmove in 0..16u8 {
            let mut core = SpriteCore::new(SpriteId::Missile0);
            core.hmove = hmove;
            core.prepare_for_hmove(false);

            let mut clocks = 0;
            for ripple in (0..16u8).rev() {
                let clk = SpriteClock {
                    motck: false,
                    hmove: true,
                    hmove_count: ripple,
                };
                if core.motion(clk) != Motion::Skipped {
                    clocks += 1;
                }
            }
            assert_eq!(clocks, hmove, "hmove {}", hmove);
            assert!(!core.more_hmove);
        }
    }

    #[test]
    fn test_stuffed_tick_noted() {
        let mut core = SpriteCore::new(SpriteId::Missile0);
        core.hmove = 2;
        core.prepare_for_hmove(true);

        core.motion(SpriteClock {
            motck: false,
            hmove: true,
            hmove_count: 15,
        });
        assert!(core.stuffed_tick);

        core.motion(SpriteClock {
            motck: true,
            hmove: false,
            hmove_count: 0,
        });
        assert!(!core.stuffed_tick);
    }

    #[test]
    fn test_fire_reset_on_screen() {
        let mut core = SpriteCore::new(SpriteId::Missile0);
        core.pclk.tick();
        core.position.tick();
        core.fire_reset(40);
        assert_eq!(core.reset_pixel, 41);
        assert_eq!(core.hmoved_pixel, 41);
        assert_eq!(core.position.count(), 0);
        assert_eq!(core.pclk, PhaseClock::RisingPhi1);
    }

    #[test]
    fn test_fire_reset_off_screen() {
        let mut core = SpriteCore::new(SpriteId::Missile0);
        core.fire_reset(-30);
        assert_eq!(core.reset_pixel, 0);
        assert_eq!(core.hmoved_pixel, 7);
    }

    #[test]
    fn test_hblank_hmove_moves_hmoved_pixel() {
        let mut core = SpriteCore::new(SpriteId::Missile0);
        core.hmoved_pixel = 155;
        core.prepare_for_hmove(true);
        assert_eq!(core.hmoved_pixel, 3);

        core.prepare_for_hmove(false);
        assert_eq!(core.hmoved_pixel, 3);
    }

    #[test]
    fn test_rsync_wraps_presentation_pixels() {
        let mut core = SpriteCore::new(SpriteId::Missile0);
        core.reset_pixel = 10;
        core.hmoved_pixel = 100;
        core.rsync(20);
        assert_eq!(core.reset_pixel, 150);
        assert_eq!(core.hmoved_pixel, 80);
    }

    #[test]
    fn test_second_reset_sets_restart() {
        let mut core = SpriteCore::new(SpriteId::Missile0);
        let sig = Signals::default();

        core.schedule_reset(&sig);
        assert!(!core.reset_restart);
        assert!(core.start_condition());

        core.schedule_reset(&sig);
        assert!(core.reset_restart);
        assert_eq!(core.delay.len(), 1);
        assert!(!core.start_condition());
    }

    #[test]
    fn test_hmove_writes_share_one_latch() {
        let mut core = SpriteCore::new(SpriteId::Missile0);
        for _ in 0..(MAX_PENDING * 2) {
            core.schedule_hmove(0x00, true);
        }
        core.schedule_hmove(0x10, false);
        assert_eq!(core.delay.pending_labels(), vec!["HMM0"]);

        core.delay.tick();
        assert!(core.delay.next_fired().is_none());
        core.delay.tick();
        assert_eq!(
            core.delay.next_fired().map(|(_, ev)| ev),
            Some(SpriteEvent::Hmove(0x10))
        );

        // a write after the last one fired starts a fresh countdown
        core.schedule_hmove(0x20, false);
        assert_eq!(core.delay.len(), 1);
    }

    #[test]
    fn test_names_follow_id() {
        let core = SpriteCore::new(SpriteId::Player1);
        assert_eq!(core.label(), "Player 1");
        assert_eq!(SpriteId::Ball.names().reset, "RESBL");
        assert_eq!(SpriteId::Missile1.names().hmove, "HMM1");
    }

    #[test]
    fn test_copies_glyphs() {
        assert_eq!(copies_glyph(0x00), "|");
        assert_eq!(copies_glyph(0x03), "|_|_|");
        assert_eq!(copies_glyph(0x06), "|__|__|");
        // double/quad size players show a single copy
        assert_eq!(copies_glyph(0x05), "|");
    }
}
