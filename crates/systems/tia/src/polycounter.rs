//! Horizontal position counter used by every sprite.
//!
//! The real chip uses a 6-bit polynomial counter that resets itself after 40
//! states. Only the ordering of states matters to the sprites, so a plain
//! modulo counter stands in for it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of states before the counter wraps
pub const POSITION_MODULUS: u8 = 40;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polycounter {
    count: u8,
}

impl Polycounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only to be called on the owning sprite's Phi2 edge. Returns the new count.
    pub fn tick(&mut self) -> u8 {
        self.count += 1;
        if self.count == POSITION_MODULUS {
            self.count = 0;
        }
        self.count
    }

    /// Zero the count. The sprite's phase clock is reset separately.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u8 {
        self.count
    }
}

impl fmt::Display for Polycounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_after_forty_ticks() {
        let mut pos = Polycounter::new();
        for _ in 0..7 {
            pos.tick();
        }
        let start = pos.count();

        for i in 1..=POSITION_MODULUS {
            let c = pos.tick();
            if i < POSITION_MODULUS {
                assert_ne!(c, start);
            }
        }
        assert_eq!(pos.count(), start);
    }

    #[test]
    fn test_counts_to_39_then_zero() {
        let mut pos = Polycounter::new();
        for _ in 0..39 {
            pos.tick();
        }
        assert_eq!(pos.count(), 39);
        assert_eq!(pos.tick(), 0);
    }

    #[test]
    fn test_reset() {
        let mut pos = Polycounter::new();
        pos.tick();
        pos.tick();
        pos.reset();
        assert_eq!(pos.count(), 0);
        assert_eq!(pos.to_string(), "00");
    }
}
