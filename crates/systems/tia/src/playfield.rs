//! Playfield (PF0, PF1, PF2)
//!
//! 20 bits of pattern cover the left half of the screen, each bit four clocks
//! wide. The right half repeats the pattern or, with CTRLPF reflect set, mirrors
//! it.
//!
//! ```text
//! PF0 bits 4..7 | PF1 bits 7..0 | PF2 bits 0..7
//!    0..3       |    4..11      |    12..19
//! ```

use serde::{Deserialize, Serialize};

use crate::registers::Ctrlpf;

pub const PLAYFIELD_BITS: usize = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playfield {
    pub pf0: u8,
    pub pf1: u8,
    pub pf2: u8,
    data: [bool; PLAYFIELD_BITS],

    pub reflected: bool,
    pub scoremode: bool,
    pub priority: bool,

    pub foreground_color: u8,
    pub background_color: u8,

    /// Bit latched for the current four-clock block
    current: bool,
    /// The current block is on the right half of the screen
    right_half: bool,
}

impl Playfield {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pf0(&mut self, value: u8) {
        self.pf0 = value & 0xf0;
        self.update_data();
    }

    pub fn set_pf1(&mut self, value: u8) {
        self.pf1 = value;
        self.update_data();
    }

    pub fn set_pf2(&mut self, value: u8) {
        self.pf2 = value;
        self.update_data();
    }

    /// Playfield half of a CTRLPF write. The ball takes the size field.
    pub fn set_control(&mut self, ctrl: Ctrlpf) {
        self.reflected = ctrl.reflect;
        self.scoremode = ctrl.score;
        self.priority = ctrl.priority;
    }

    pub fn set_color(&mut self, value: u8) {
        self.foreground_color = value;
    }

    pub fn set_background_color(&mut self, value: u8) {
        self.background_color = value;
    }

    /// Advance to visible column `column`, or None during HBLANK
    pub fn tick(&mut self, column: Option<u8>) {
        let Some(column) = column else {
            self.current = false;
            return;
        };

        if column % 4 != 0 {
            return;
        }

        let idx = (column / 4) as usize;
        self.right_half = idx >= PLAYFIELD_BITS;
        self.current = if !self.right_half {
            self.data[idx]
        } else if self.reflected {
            self.data[2 * PLAYFIELD_BITS - 1 - idx]
        } else {
            self.data[idx - PLAYFIELD_BITS]
        };
    }

    /// Whether the playfield is drawing this clock, and its color
    pub fn pixel(&self) -> (bool, u8) {
        (self.current, self.foreground_color)
    }

    /// Score mode colors the halves with the player colors
    pub fn is_right_half(&self) -> bool {
        self.right_half
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn update_data(&mut self) {
        for i in 0..4 {
            self.data[i] = self.pf0 & (0x10 << i) != 0;
        }
        for i in 0..8 {
            self.data[4 + i] = self.pf1 & (0x80 >> i) != 0;
            self.data[12 + i] = self.pf2 & (0x01 << i) != 0;
        }
    }
}
