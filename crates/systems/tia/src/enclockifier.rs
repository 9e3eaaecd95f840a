//! Graphics serializer for the missile and ball sprites
//!
//! Once started, the enclockifier holds `enable` high for 1, 2, 4 or 8 clocks
//! depending on the sprite's size. The end of the run is an event in the
//! owning sprite's delay queue so that it can be paused and forced along with
//! everything else the sprite has pending.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::future::{EventHandle, Scheduler};

/// Events the enclockifier schedules on its sprite's delay queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnclockEvent {
    /// Halfway through an 8x run
    SecondHalf,
    End,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Enclockifier {
    pub enable: bool,
    /// Which copy is being drawn: 0 primary, 1 second, 2 third
    pub cpy: u8,
    second_half: bool,
    size: u8,
    end_event: Option<(EventHandle, EnclockEvent)>,
}

impl Enclockifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a run for a sprite of the given size (0..=3)
    pub fn start<A: From<EnclockEvent>>(&mut self, size: u8, delay: &mut Scheduler<A>) {
        // restarting mid-run abandons the old end
        if let Some((h, _)) = self.end_event.take() {
            delay.drop(h);
        }

        self.enable = true;
        self.second_half = false;
        self.size = size & 0x03;

        let (ticks, ev) = match self.size {
            0x00 => (1, EnclockEvent::End),
            0x01 => (2, EnclockEvent::End),
            0x02 => (4, EnclockEvent::End),
            _ => (4, EnclockEvent::SecondHalf),
        };
        self.schedule(ticks, ev, delay);
    }

    /// Called by the owning sprite when one of our events fires
    pub fn fired<A: From<EnclockEvent>>(
        &mut self,
        handle: EventHandle,
        ev: EnclockEvent,
        delay: &mut Scheduler<A>,
    ) {
        if matches!(self.end_event, Some((h, _)) if h == handle) {
            self.end_event = None;
        }
        self.apply(ev, delay);
    }

    /// Freeze the run where it is
    pub fn pause<A>(&self, delay: &mut Scheduler<A>) {
        if let Some((h, _)) = self.end_event {
            delay.pause(h);
        }
    }

    /// Resolve the pending end of the run immediately
    pub fn force<A: From<EnclockEvent>>(&mut self, delay: &mut Scheduler<A>) {
        if let Some((h, ev)) = self.end_event.take() {
            delay.drop(h);
            self.apply(ev, delay);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn apply<A: From<EnclockEvent>>(&mut self, ev: EnclockEvent, delay: &mut Scheduler<A>) {
        match ev {
            EnclockEvent::End => {
                self.enable = false;
            }
            EnclockEvent::SecondHalf => {
                self.second_half = true;
                self.schedule(4, EnclockEvent::End, delay);
            }
        }
    }

    fn schedule<A: From<EnclockEvent>>(
        &mut self,
        ticks: u32,
        ev: EnclockEvent,
        delay: &mut Scheduler<A>,
    ) {
        let h = delay.schedule(ticks, A::from(ev), "END");
        self.end_event = Some((h, ev));
    }
}

impl fmt::Display for Enclockifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cpy {
            0 => write!(f, "1st")?,
            1 => write!(f, "2nd")?,
            _ => write!(f, "3rd")?,
        }
        if self.size == 0x03 {
            if self.second_half {
                write!(f, " (2nd half)")?;
            } else {
                write!(f, " (1st half)")?;
            }
        }
        Ok(())
    }
}
