//! Television standards and core configuration.
//!
//! Horizontal timing is identical for both supported standards; only the number
//! of scanlines (and the refresh rate that follows from it) differs.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::{LogCategory, LogConfig, LogLevel};

/// Color clocks of horizontal blank at the start of every scanline
pub const CLOCKS_PER_HBLANK: u16 = 68;
/// Visible color clocks per scanline
pub const CLOCKS_PER_VISIBLE: u16 = 160;
/// Total color clocks per scanline
pub const CLOCKS_PER_SCANLINE: u16 = CLOCKS_PER_HBLANK + CLOCKS_PER_VISIBLE;
/// Extra blank clocks while the HMOVE latch is set (the "comb")
pub const HMOVE_EXTRA_HBLANK: u16 = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unknown TV standard: {0}")]
    UnknownStandard(String),
    #[error("Unknown log level: {0}")]
    UnknownLogLevel(String),
    #[error("Unknown log category: {0}")]
    UnknownLogCategory(String),
}

/// Broadcast standard of the television the chip is driving
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TvStandard {
    #[default]
    Ntsc,
    Pal,
}

impl TvStandard {
    pub fn spec(self) -> &'static TvSpec {
        match self {
            TvStandard::Ntsc => &SPEC_NTSC,
            TvStandard::Pal => &SPEC_PAL,
        }
    }
}

impl FromStr for TvStandard {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ntsc" => Ok(TvStandard::Ntsc),
            "pal" => Ok(TvStandard::Pal),
            _ => Err(ConfigError::UnknownStandard(s.to_string())),
        }
    }
}

/// Vertical timing of a television standard
#[derive(Debug, Clone, PartialEq)]
pub struct TvSpec {
    pub id: &'static str,
    pub scanlines_total: u16,
    /// First scanline normally shown by a television
    pub scanline_top: u16,
    /// Last scanline normally shown by a television
    pub scanline_bottom: u16,
    pub frames_per_second: f32,
}

impl TvSpec {
    pub fn visible_scanlines(&self) -> u16 {
        self.scanline_bottom - self.scanline_top + 1
    }
}

pub const SPEC_NTSC: TvSpec = TvSpec {
    id: "NTSC",
    scanlines_total: 262,
    scanline_top: 40,
    scanline_bottom: 231,
    frames_per_second: 60.0,
};

pub const SPEC_PAL: TvSpec = TvSpec {
    id: "PAL",
    scanlines_total: 312,
    scanline_top: 48,
    scanline_bottom: 275,
    frames_per_second: 50.0,
};

/// Logging section of the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global level ("off", "error", ... "trace")
    #[serde(default)]
    pub level: Option<String>,
    /// Category name -> level
    #[serde(default)]
    pub categories: HashMap<String, String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Maximum messages per second per category
    #[serde(default)]
    pub rate_limit: Option<usize>,
}

/// Configuration for a TIA instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TiaConfig {
    #[serde(default)]
    pub tv: TvStandard,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TiaConfig {
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Push the logging section into the global `LogConfig`.
    ///
    /// Every entry is validated before anything is applied, so a bad config
    /// leaves the current logging setup untouched.
    pub fn apply_logging(&self) -> Result<(), ConfigError> {
        let global = match &self.logging.level {
            Some(s) => Some(parse_level(s)?),
            None => None,
        };

        let mut categories = Vec::with_capacity(self.logging.categories.len());
        for (name, level) in &self.logging.categories {
            let category = LogCategory::from_str(name)
                .ok_or_else(|| ConfigError::UnknownLogCategory(name.clone()))?;
            categories.push((category, parse_level(level)?));
        }

        let config = LogConfig::global();
        if let Some(level) = global {
            config.set_global_level(level);
        }
        for (category, level) in categories {
            config.set_level(category, level);
        }
        if let Some(max) = self.logging.rate_limit {
            config.set_rate_limit(max);
        }
        if let Some(path) = &self.logging.file {
            config.set_log_file(path.clone())?;
        }

        Ok(())
    }
}

fn parse_level(s: &str) -> Result<LogLevel, ConfigError> {
    LogLevel::from_str(s).ok_or_else(|| ConfigError::UnknownLogLevel(s.to_string()))
}
