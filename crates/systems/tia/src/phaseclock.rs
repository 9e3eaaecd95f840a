//! Two-phase clock dividing the color clock by four
//!
//! Every sprite owns one of these. The chip has its own as well, which times the
//! HMOVE stuffing pulses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Edge signalled by a phase clock tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Phi1,
    Phi2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseClock {
    #[default]
    RisingPhi1,
    FallingPhi1,
    RisingPhi2,
    FallingPhi2,
}

impl PhaseClock {
    pub const NUM_STATES: u8 = 4;

    pub fn reset(&mut self) {
        *self = PhaseClock::RisingPhi1;
    }

    /// Advance by one color clock and report the edge (if any) now asserted
    pub fn tick(&mut self) -> Option<Edge> {
        *self = match self {
            PhaseClock::RisingPhi1 => PhaseClock::FallingPhi1,
            PhaseClock::FallingPhi1 => PhaseClock::RisingPhi2,
            PhaseClock::RisingPhi2 => PhaseClock::FallingPhi2,
            PhaseClock::FallingPhi2 => PhaseClock::RisingPhi1,
        };

        if self.phi1() {
            Some(Edge::Phi1)
        } else if self.phi2() {
            Some(Edge::Phi2)
        } else {
            None
        }
    }

    pub fn phi1(&self) -> bool {
        *self == PhaseClock::RisingPhi1
    }

    pub fn phi2(&self) -> bool {
        *self == PhaseClock::RisingPhi2
    }
}

impl fmt::Display for PhaseClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhaseClock::RisingPhi1 => "_*--",
            PhaseClock::FallingPhi1 => "_-*-",
            PhaseClock::RisingPhi2 => "-_*_",
            PhaseClock::FallingPhi2 => "-__*",
        };
        f.write_str(s)
    }
}
