//! Cycle-accurate TIA video engine
//!
//! The core is the sprite timing: phase clocks, position counters, per-sprite
//! delay queues and the HMOVE clock stuffing that moves sprites during HBLANK.
//! `Tia` wraps it with the chip's register map and horizontal timing and
//! produces one color signal per clock for a `Television`.

#![allow(clippy::upper_case_acronyms)]

pub mod ball;
pub mod collisions;
pub mod enclockifier;
pub mod future;
pub mod missile;
pub mod phaseclock;
pub mod player;
pub mod playfield;
pub mod polycounter;
pub mod registers;
pub mod sprite;
pub mod tia;
pub mod video;

use thiserror::Error;
use vcs_core::ConfigError;

pub use registers::{Ctrlpf, Nusiz, Register};
pub use sprite::Sprite;
pub use tia::Tia;
pub use video::Video;

#[derive(Debug, Error)]
pub enum TiaError {
    #[error("Unknown TIA register: {0:#04x}")]
    UnknownRegister(u8),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcs_core::TiaConfig;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TiaError::UnknownRegister(0x2d).to_string(),
            "Unknown TIA register: 0x2d"
        );
    }

    #[test]
    fn test_from_config() {
        let config = TiaConfig::from_json(r#"{ "tv": "PAL" }"#).unwrap();
        let tia = Tia::from_config(&config).unwrap();
        assert_eq!(tia.tv_spec().scanlines_total, 312);
    }

    #[test]
    fn test_from_config_rejects_bad_logging() {
        let config =
            TiaConfig::from_json(r#"{ "logging": { "categories": { "audio": "trace" } } }"#)
                .unwrap();
        assert!(matches!(
            Tia::from_config(&config),
            Err(TiaError::Config(ConfigError::UnknownLogCategory(_)))
        ));
    }
}
