//! Television collaborator interface
//!
//! The TIA produces one signal per color clock and hands it to whatever is
//! playing the role of the television:
//!
//! ```text
//! Tia (timing + sprites) -> Television trait -> {recorder, frame assembler, ...}
//! ```
//!
//! Turning color indices into RGB and assembling frames belongs to the
//! television side. This crate only ships a recorder, which is what tests and
//! diagnostics need.

use serde::{Deserialize, Serialize};

use crate::config::{CLOCKS_PER_HBLANK, CLOCKS_PER_SCANLINE};
use crate::types::ColorSignal;

/// Everything the chip tells the television for one color clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalAttributes {
    pub vsync: bool,
    pub vblank: bool,
    pub hblank: bool,
    pub color: ColorSignal,
}

/// Receiver of the chip's per-clock output
pub trait Television {
    /// Accept the signal for one color clock
    fn signal(&mut self, sig: SignalAttributes);

    /// Reset to the power-on state
    fn reset(&mut self) {}

    fn name(&self) -> &str;
}

/// Television that keeps every signal it is sent.
///
/// Signals are grouped by scanline on the assumption that the first signal
/// received is clock 0 of a scanline, which is how the chip starts after
/// power-on or reset.
#[derive(Debug, Clone, Default)]
pub struct ScanlineRecorder {
    signals: Vec<SignalAttributes>,
}

impl ScanlineRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> &[SignalAttributes] {
        &self.signals
    }

    /// Number of complete scanlines recorded
    pub fn scanlines(&self) -> usize {
        self.signals.len() / CLOCKS_PER_SCANLINE as usize
    }

    /// All 228 clocks of scanline `n`, or None if it hasn't been fully recorded
    pub fn scanline(&self, n: usize) -> Option<&[SignalAttributes]> {
        let width = CLOCKS_PER_SCANLINE as usize;
        self.signals.get(n * width..(n + 1) * width)
    }

    /// The 160 visible columns of scanline `n`
    pub fn visible(&self, n: usize) -> Option<Vec<ColorSignal>> {
        self.scanline(n).map(|line| {
            line[CLOCKS_PER_HBLANK as usize..]
                .iter()
                .map(|sig| sig.color)
                .collect()
        })
    }

    pub fn clear(&mut self) {
        self.signals.clear();
    }
}

impl Television for ScanlineRecorder {
    fn signal(&mut self, sig: SignalAttributes) {
        self.signals.push(sig);
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn name(&self) -> &str {
        "Scanline Recorder"
    }
}

/// Television that throws everything away (benchmarks, headless runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelevision;

impl Television for NullTelevision {
    fn signal(&mut self, _sig: SignalAttributes) {}

    fn name(&self) -> &str {
        "Null Television"
    }
}
