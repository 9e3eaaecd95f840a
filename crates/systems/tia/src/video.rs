//! Compositor
//!
//! Ticks every sprite and the playfield in lock-step and resolves which one
//! colors the current clock. Players tick first so that the missiles see this
//! clock's scan counters on their reset-to-player wire.
//!
//! Priority, highest first:
//!
//! ```text
//! normal:    P0/M0 > P1/M1 > PF/BL > BK
//! priority:  PF/BL > P0/M0 > P1/M1 > BK
//! ```

use serde::{Deserialize, Serialize};
use vcs_core::logging::{log, LogCategory, LogLevel};

use crate::ball::Ball;
use crate::collisions::{Collisions, Objects};
use crate::missile::Missile;
use crate::player::Player;
use crate::playfield::Playfield;
use crate::registers::{Ctrlpf, Register};
use crate::sprite::{Signals, Sprite, SpriteClock};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub player0: Player,
    pub player1: Player,
    pub missile0: Missile,
    pub missile1: Missile,
    pub ball: Ball,
    pub playfield: Playfield,
    pub collisions: Collisions,
}

impl Default for Video {
    fn default() -> Self {
        Self::new()
    }
}

impl Video {
    pub fn new() -> Self {
        Self {
            player0: Player::new(0),
            player1: Player::new(1),
            missile0: Missile::new(0),
            missile1: Missile::new(1),
            ball: Ball::new(),
            playfield: Playfield::new(),
            collisions: Collisions::new(),
        }
    }

    /// Every sprite, in tick order
    pub fn sprites_mut(&mut self) -> [&mut dyn Sprite; 5] {
        [
            &mut self.player0,
            &mut self.player1,
            &mut self.missile0,
            &mut self.missile1,
            &mut self.ball,
        ]
    }

    pub fn sprites(&self) -> [&dyn Sprite; 5] {
        [
            &self.player0,
            &self.player1,
            &self.missile0,
            &self.missile1,
            &self.ball,
        ]
    }

    /// One color clock. `column` is the visible column, None during HBLANK.
    pub fn tick(&mut self, clk: SpriteClock, mut sig: Signals, column: Option<u8>) {
        self.player0.tick(clk, &sig);
        self.player1.tick(clk, &sig);

        sig.players = [self.player0.scan_state(), self.player1.scan_state()];

        self.missile0.tick(clk, &sig);
        self.missile1.tick(clk, &sig);
        self.ball.tick(clk, &sig);

        self.playfield.tick(column);
    }

    /// Color for this clock. Collisions are only latched while `visible`.
    pub fn resolve(&mut self, visible: bool) -> u8 {
        let (p0, p0_color) = self.player0.pixel();
        let (p1, p1_color) = self.player1.pixel();
        let (m0, m0_color) = self.missile0.pixel();
        let (m1, m1_color) = self.missile1.pixel();
        let (bl, bl_color) = self.ball.pixel();
        let (pf, mut pf_color) = self.playfield.pixel();

        if visible {
            self.collisions.tick(Objects {
                p0,
                p1,
                m0,
                m1,
                bl,
                pf,
            });
        }

        if self.playfield.scoremode && !self.playfield.priority {
            pf_color = if self.playfield.is_right_half() {
                p1_color
            } else {
                p0_color
            };
        }

        let layers = [
            (p0, p0_color),
            (m0, m0_color),
            (p1, p1_color),
            (m1, m1_color),
        ];
        let field = [(pf, pf_color), (bl, bl_color)];

        let mut order = if self.playfield.priority {
            field.iter().chain(layers.iter())
        } else {
            layers.iter().chain(field.iter())
        };

        order
            .find(|&&(on, _)| on)
            .map(|&(_, color)| color)
            .unwrap_or(self.playfield.background_color)
    }

    /// Apply a write to one of the sprite or playfield registers. Returns false
    /// if `reg` isn't one of ours.
    pub fn update(&mut self, reg: Register, value: u8, sig: &Signals) -> bool {
        match reg {
            Register::Nusiz0 => {
                self.player0.set_nusiz(value);
                self.missile0.set_nusiz(value);
            }
            Register::Nusiz1 => {
                self.player1.set_nusiz(value);
                self.missile1.set_nusiz(value);
            }
            Register::Colup0 => {
                self.player0.set_color(value);
                self.missile0.set_color(value);
            }
            Register::Colup1 => {
                self.player1.set_color(value);
                self.missile1.set_color(value);
            }
            Register::Colupf => {
                self.playfield.set_color(value);
                self.ball.set_color(value);
            }
            Register::Colubk => self.playfield.set_background_color(value),
            Register::Ctrlpf => {
                let ctrl = Ctrlpf::decode(value);
                self.playfield.set_control(ctrl);
                self.ball.set_size(ctrl.ball_size);
            }
            Register::Refp0 => self.player0.set_reflection(value),
            Register::Refp1 => self.player1.set_reflection(value),
            Register::Pf0 => self.playfield.set_pf0(value),
            Register::Pf1 => self.playfield.set_pf1(value),
            Register::Pf2 => self.playfield.set_pf2(value),
            Register::Resp0 => self.player0.reset_position(sig),
            Register::Resp1 => self.player1.reset_position(sig),
            Register::Resm0 => self.missile0.reset_position(sig),
            Register::Resm1 => self.missile1.reset_position(sig),
            Register::Resbl => self.ball.reset_position(sig),
            Register::Grp0 => {
                self.player0.set_gfx_data(value);
                self.player1.latch_old_gfx();
            }
            Register::Grp1 => {
                self.player1.set_gfx_data(value);
                self.player0.latch_old_gfx();
                self.ball.latch_enable_delay();
            }
            Register::Enam0 => self.missile0.set_enable(value),
            Register::Enam1 => self.missile1.set_enable(value),
            Register::Enabl => self.ball.set_enable(value),
            Register::Hmp0 => self.player0.set_hmove_value(value, false),
            Register::Hmp1 => self.player1.set_hmove_value(value, false),
            Register::Hmm0 => self.missile0.set_hmove_value(value, false),
            Register::Hmm1 => self.missile1.set_hmove_value(value, false),
            Register::Hmbl => self.ball.set_hmove_value(value, false),
            Register::Vdelp0 => self.player0.set_vertical_delay(value),
            Register::Vdelp1 => self.player1.set_vertical_delay(value),
            Register::Vdelbl => self.ball.set_vertical_delay(value),
            Register::Resmp0 => self.missile0.set_reset_to_player(value),
            Register::Resmp1 => self.missile1.set_reset_to_player(value),
            Register::Hmclr => {
                for sprite in self.sprites_mut() {
                    sprite.set_hmove_value(0, true);
                }
            }
            Register::Cxclr => self.collisions.clear(),
            _ => return false,
        }
        true
    }

    /// HMOVE strobe
    pub fn prepare_for_hmove(&mut self, hblank: bool) {
        for sprite in self.sprites_mut() {
            sprite.prepare_for_hmove(hblank);
        }
        log(LogCategory::Hmove, LogLevel::Trace, || {
            let pending: Vec<&str> = self
                .sprites()
                .iter()
                .filter(|s| s.core().hmove != 8)
                .map(|s| s.label())
                .collect();
            format!("strobe, hblank {} moving [{}]", hblank, pending.join(", "))
        });
    }

    /// Shift presentation pixels after RSYNC
    pub fn rsync(&mut self, adjustment: i32) {
        for sprite in self.sprites_mut() {
            sprite.rsync(adjustment);
        }
    }

    pub fn reset(&mut self) {
        for sprite in self.sprites_mut() {
            sprite.reset();
        }
        self.playfield.reset();
        self.collisions.clear();
    }

    /// Machine info for every sprite, one per line
    pub fn machine_info(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}",
            self.player0, self.player1, self.missile0, self.missile1, self.ball
        )
    }
}
