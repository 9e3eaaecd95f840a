//! Shared infrastructure for the TIA video core: logging, configuration and the
//! television collaborator interface.

pub mod config;
pub mod logging;
pub mod television;
pub mod types {
    use serde::{Deserialize, Serialize};

    /// Output of the chip for one color clock.
    ///
    /// The index is the raw value of a color register; palette lookup is the
    /// television's job.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub enum ColorSignal {
        /// Nothing is being sent (blanking)
        #[default]
        VideoBlack,
        Color(u8),
    }

    impl ColorSignal {
        pub fn index(self) -> Option<u8> {
            match self {
                ColorSignal::VideoBlack => None,
                ColorSignal::Color(c) => Some(c),
            }
        }
    }
}

pub use config::{ConfigError, TiaConfig, TvSpec, TvStandard};
pub use television::{ScanlineRecorder, SignalAttributes, Television};
pub use types::ColorSignal;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_signal_index() {
        assert_eq!(ColorSignal::Color(0x1e).index(), Some(0x1e));
        assert_eq!(ColorSignal::VideoBlack.index(), None);
        assert_eq!(ColorSignal::default(), ColorSignal::VideoBlack);
    }
}
