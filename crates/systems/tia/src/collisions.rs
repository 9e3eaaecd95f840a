//! Collision latches
//!
//! Fifteen latches, one per pair of objects, packed into the top two bits of
//! the eight CXxx read registers. Latches are only set while the beam is
//! visible and stay set until CXCLR.

use serde::{Deserialize, Serialize};

/// Objects drawing on one clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Objects {
    pub p0: bool,
    pub p1: bool,
    pub m0: bool,
    pub m1: bool,
    pub bl: bool,
    pub pf: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collisions {
    /// CXM0P, CXM1P, CXP0FB, CXP1FB, CXM0FB, CXM1FB, CXBLPF, CXPPMM
    latches: [u8; 8],
}

impl Collisions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, o: Objects) {
        let pair = |a: bool, b: bool| -> u8 { u8::from(a) << 7 | u8::from(b) << 6 };

        self.latches[0] |= pair(o.m0 && o.p1, o.m0 && o.p0);
        self.latches[1] |= pair(o.m1 && o.p0, o.m1 && o.p1);
        self.latches[2] |= pair(o.p0 && o.pf, o.p0 && o.bl);
        self.latches[3] |= pair(o.p1 && o.pf, o.p1 && o.bl);
        self.latches[4] |= pair(o.m0 && o.pf, o.m0 && o.bl);
        self.latches[5] |= pair(o.m1 && o.pf, o.m1 && o.bl);
        self.latches[6] |= pair(o.bl && o.pf, false);
        self.latches[7] |= pair(o.p0 && o.p1, o.m0 && o.m1);
    }

    /// Value of collision register `reg` (0..=7)
    pub fn read(&self, reg: u8) -> u8 {
        self.latches[(reg & 0x07) as usize]
    }

    /// CXCLR
    pub fn clear(&mut self) {
        self.latches = [0; 8];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latches_until_cleared() {
        let mut cx = Collisions::new();
        cx.tick(Objects {
            p0: true,
            pf: true,
            ..Default::default()
        });
        // nothing overlapping on the next clock doesn't undo it
        cx.tick(Objects::default());

        assert_eq!(cx.read(0x02), 0x80);
        assert_eq!(cx.read(0x00), 0x00);

        cx.clear();
        assert_eq!(cx.read(0x02), 0x00);
    }

    #[test]
    fn test_every_pair_has_one_bit() {
        let mut cx = Collisions::new();
        cx.tick(Objects {
            p0: true,
            p1: true,
            m0: true,
            m1: true,
            bl: true,
            pf: true,
        });

        let bits: u32 = (0..8).map(|r| cx.read(r).count_ones()).sum();
        assert_eq!(bits, 15);
        assert_eq!(cx.read(0x06), 0x80);
    }

    #[test]
    fn test_missile_player() {
        let mut cx = Collisions::new();
        cx.tick(Objects {
            m1: true,
            p1: true,
            ..Default::default()
        });
        assert_eq!(cx.read(0x01), 0x40);
        assert_eq!(cx.read(0x07), 0x00);
    }
}
