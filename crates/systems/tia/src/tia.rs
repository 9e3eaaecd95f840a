//! TIA (Television Interface Adaptor)
//!
//! Chip level timing around the video core. The CPU side drives the chip with
//! register writes and color clocks; every clock produces one signal for the
//! television.
//!
//! A scanline is 228 color clocks: 68 of horizontal blank followed by 160
//! visible. An HMOVE strobe extends the blank by 8 clocks for the rest of the
//! line, and for the next 16 Phi2 edges of the chip's own phase clock sends a
//! stuffing pulse to every sprite still owed movement.

use serde::{Deserialize, Serialize};
use vcs_core::config::{
    TiaConfig, TvSpec, TvStandard, CLOCKS_PER_HBLANK, CLOCKS_PER_SCANLINE, HMOVE_EXTRA_HBLANK,
};
use vcs_core::logging::{log, LogCategory, LogLevel};
use vcs_core::television::{SignalAttributes, Television};
use vcs_core::types::ColorSignal;

use crate::phaseclock::{Edge, PhaseClock};
use crate::registers::{Register, CXM0P, CXPPMM};
use crate::sprite::{Signals, SpriteClock};
use crate::video::Video;
use crate::TiaError;

/// First value of the HMOVE ripple counter
const HMOVE_RIPPLE_START: u8 = 15;

/// Color clocks per CPU cycle
pub const CLOCKS_PER_CPU_CYCLE: u32 = 3;

/// TIA chip state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tia {
    standard: TvStandard,

    pub video: Video,

    /// Horizontal clock, 0..228
    clock: u16,
    scanline: u16,
    frame: u64,

    pclk: PhaseClock,
    hmove_latch: bool,
    /// HMOVE ripple counter while stuffing is in progress
    ripple: Option<u8>,
    hblank: bool,

    vsync: bool,
    vblank: bool,
    wsync: bool,
}

impl Default for Tia {
    fn default() -> Self {
        Self::new(TvStandard::default())
    }
}

impl Tia {
    /// Create a new TIA chip
    pub fn new(standard: TvStandard) -> Self {
        Self {
            standard,
            video: Video::new(),
            clock: 0,
            scanline: 0,
            frame: 0,
            pclk: PhaseClock::default(),
            hmove_latch: false,
            ripple: None,
            hblank: true,
            vsync: false,
            vblank: false,
            wsync: false,
        }
    }

    /// Create a chip for the configured TV standard, applying the logging
    /// settings on the way
    pub fn from_config(config: &TiaConfig) -> Result<Self, TiaError> {
        config.apply_logging()?;
        Ok(Self::new(config.tv))
    }

    /// Reset TIA to power-on state
    pub fn reset(&mut self) {
        self.video.reset();
        self.clock = 0;
        self.scanline = 0;
        self.frame = 0;
        self.pclk.reset();
        self.hmove_latch = false;
        self.ripple = None;
        self.hblank = true;
        self.vsync = false;
        self.vblank = false;
        self.wsync = false;
    }

    pub fn standard(&self) -> TvStandard {
        self.standard
    }

    pub fn tv_spec(&self) -> &'static TvSpec {
        self.standard.spec()
    }

    pub fn clock(&self) -> u16 {
        self.clock
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn hblank(&self) -> bool {
        self.hblank
    }

    pub fn hmove_latch(&self) -> bool {
        self.hmove_latch
    }

    /// The CPU should stay halted until the start of the next scanline
    pub fn wsync_requested(&self) -> bool {
        self.wsync
    }

    /// Column of the last signal sent to the television, negative in HBLANK
    pub fn tv_horiz_pos(&self) -> i32 {
        let last = (self.clock + CLOCKS_PER_SCANLINE - 1) % CLOCKS_PER_SCANLINE;
        last as i32 - CLOCKS_PER_HBLANK as i32
    }

    fn signals(&self) -> Signals {
        Signals {
            hblank: self.hblank,
            hmove_latch: self.hmove_latch,
            tv_horiz_pos: self.tv_horiz_pos(),
            players: Default::default(),
        }
    }

    /// Write to TIA register. Unknown addresses are logged and ignored.
    pub fn write(&mut self, addr: u8, value: u8) {
        let reg = match Register::try_from(addr) {
            Ok(reg) => reg,
            Err(e) => {
                log(LogCategory::Stubs, LogLevel::Warn, || format!("{}", e));
                return;
            }
        };

        log(LogCategory::Tia, LogLevel::Trace, || {
            format!(
                "{:?} = {:#04x} (line {}, clock {})",
                reg, value, self.scanline, self.clock
            )
        });

        match reg {
            Register::Vsync => {
                let on = value & 0x02 == 0x02;
                // falling edge ends the frame
                if self.vsync && !on {
                    self.new_frame();
                }
                self.vsync = on;
            }
            Register::Vblank => self.vblank = value & 0x02 == 0x02,
            Register::Wsync => self.wsync = true,
            Register::Rsync => {
                let adjustment = self.clock as i32 - CLOCKS_PER_SCANLINE as i32;
                self.video.rsync(adjustment);
                self.clock = 0;
            }
            Register::Hmove => {
                self.hmove_latch = true;
                self.ripple = Some(HMOVE_RIPPLE_START);
                self.video.prepare_for_hmove(self.hblank);
            }
            reg if reg.is_audio() => {
                log(LogCategory::Stubs, LogLevel::Trace, || {
                    format!("{:?} = {:#04x} ignored, no audio", reg, value)
                });
            }
            reg => {
                let sig = self.signals();
                self.video.update(reg, value, &sig);
            }
        }
    }

    /// Read from TIA register (collision latches)
    pub fn read(&self, addr: u8) -> u8 {
        match addr & 0x0f {
            reg @ CXM0P..=CXPPMM => self.video.collisions.read(reg),
            // input ports belong to the controllers
            _ => 0,
        }
    }

    /// Advance one color clock, sending the result to `tv`
    pub fn tick<T: Television + ?Sized>(&mut self, tv: &mut T) {
        if self.clock == CLOCKS_PER_HBLANK + HMOVE_EXTRA_HBLANK {
            self.hmove_latch = false;
        }
        self.hblank = self.clock < CLOCKS_PER_HBLANK
            || (self.hmove_latch && self.clock < CLOCKS_PER_HBLANK + HMOVE_EXTRA_HBLANK);

        let stuffing = self.pclk.tick() == Some(Edge::Phi2) && self.ripple.is_some();
        let clk = SpriteClock {
            motck: !self.hblank,
            hmove: stuffing,
            hmove_count: self.ripple.unwrap_or(0),
        };

        let column = if self.hblank {
            None
        } else {
            Some((self.clock - CLOCKS_PER_HBLANK) as u8)
        };

        let sig = self.signals();
        self.video.tick(clk, sig, column);

        if stuffing {
            self.ripple = self.ripple.and_then(|r| r.checked_sub(1));
            if self.ripple.is_none() {
                log(LogCategory::Hmove, LogLevel::Trace, || {
                    format!("stuffing done at clock {}", self.clock)
                });
            }
        }

        let index = self.video.resolve(!self.hblank);
        let color = if self.hblank || self.vblank {
            ColorSignal::VideoBlack
        } else {
            ColorSignal::Color(index)
        };

        tv.signal(SignalAttributes {
            vsync: self.vsync,
            vblank: self.vblank,
            hblank: self.hblank,
            color,
        });

        self.clock += 1;
        if self.clock == CLOCKS_PER_SCANLINE {
            self.clock = 0;
            self.new_scanline();
        }
    }

    /// Advance `clocks` color clocks
    pub fn step<T: Television + ?Sized>(&mut self, clocks: u32, tv: &mut T) {
        for _ in 0..clocks {
            self.tick(tv);
        }
    }

    /// Clock the TIA for one CPU cycle (3 color clocks)
    pub fn cpu_cycle<T: Television + ?Sized>(&mut self, tv: &mut T) {
        self.step(CLOCKS_PER_CPU_CYCLE, tv);
    }

    /// Run to the start of the next scanline, as the CPU does after WSYNC
    pub fn step_scanline<T: Television + ?Sized>(&mut self, tv: &mut T) {
        loop {
            self.tick(tv);
            if self.clock == 0 {
                break;
            }
        }
    }

    fn new_scanline(&mut self) {
        self.wsync = false;
        self.scanline += 1;

        // no VSYNC: a real set would lose vertical hold and roll
        if self.scanline >= self.tv_spec().scanlines_total {
            log(LogCategory::Tia, LogLevel::Debug, || {
                format!("frame {} ran past {} scanlines without VSYNC", self.frame, self.scanline)
            });
            self.new_frame();
        }
    }

    fn new_frame(&mut self) {
        self.scanline = 0;
        self.frame += 1;
    }

    /// Chip and sprite state, one line each
    pub fn machine_info(&self) -> String {
        format!(
            "TIA: {} line {:03} clock {:03} {}{}{}\n{}",
            self.tv_spec().id,
            self.scanline,
            self.clock,
            self.pclk,
            if self.hmove_latch { " hmove" } else { "" },
            if self.hblank { " hblank" } else { "" },
            self.video.machine_info()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcs_core::television::ScanlineRecorder;

    #[test]
    fn test_tia_creation() {
        let tia = Tia::default();
        assert_eq!(tia.scanline(), 0);
        assert_eq!(tia.clock(), 0);
        assert_eq!(tia.standard(), TvStandard::Ntsc);
    }

    #[test]
    fn test_hblank_timing() {
        let mut tia = Tia::default();
        let mut tv = ScanlineRecorder::new();
        tia.step(CLOCKS_PER_SCANLINE as u32, &mut tv);

        let line = tv.scanline(0).unwrap();
        assert!(line[67].hblank);
        assert!(!line[68].hblank);
        assert_eq!(line[67].color, ColorSignal::VideoBlack);
        assert_eq!(line[68].color, ColorSignal::Color(0));
        assert_eq!(tia.scanline(), 1);
    }

    #[test]
    fn test_hmove_extends_hblank() {
        let mut tia = Tia::default();
        let mut tv = ScanlineRecorder::new();
        tia.write(0x2a, 0);
        tia.step(2 * CLOCKS_PER_SCANLINE as u32, &mut tv);

        let line = tv.scanline(0).unwrap();
        assert!(line[75].hblank);
        assert!(!line[76].hblank);
        assert!(!tia.hmove_latch());

        // next line is back to normal
        assert!(!tv.scanline(1).unwrap()[68].hblank);
    }

    #[test]
    fn test_hmove_ripple_runs_sixteen_pulses() {
        let mut tia = Tia::default();
        let mut tv = ScanlineRecorder::new();
        tia.write(0x2a, 0);

        let mut pulses = 0;
        while tia.ripple.is_some() {
            let before = tia.ripple;
            tia.tick(&mut tv);
            if tia.ripple != before {
                pulses += 1;
            }
            assert!(tia.clock() < CLOCKS_PER_HBLANK);
        }
        assert_eq!(pulses, 16);
    }

    #[test]
    fn test_vsync_falling_edge_starts_frame() {
        let mut tia = Tia::default();
        let mut tv = ScanlineRecorder::new();
        tia.step(10 * CLOCKS_PER_SCANLINE as u32, &mut tv);
        assert_eq!(tia.scanline(), 10);

        tia.write(0x00, 0x02);
        assert_eq!(tia.frame(), 0);
        tia.write(0x00, 0x00);
        assert_eq!(tia.frame(), 1);
        assert_eq!(tia.scanline(), 0);
    }

    #[test]
    fn test_frame_rolls_without_vsync() {
        let mut tia = Tia::new(TvStandard::Pal);
        let mut tv = vcs_core::television::NullTelevision;
        tia.step(312 * CLOCKS_PER_SCANLINE as u32, &mut tv);
        assert_eq!(tia.frame(), 1);
        assert_eq!(tia.scanline(), 0);
    }

    #[test]
    fn test_vblank_forces_black() {
        let mut tia = Tia::default();
        let mut tv = ScanlineRecorder::new();
        tia.write(0x09, 0x0e); // COLUBK
        tia.write(0x01, 0x02);
        tia.step(CLOCKS_PER_SCANLINE as u32, &mut tv);
        assert!(tv.visible(0).unwrap().iter().all(|&c| c == ColorSignal::VideoBlack));
        assert!(tv.scanline(0).unwrap()[100].vblank);

        tia.write(0x01, 0x00);
        tia.step(CLOCKS_PER_SCANLINE as u32, &mut tv);
        assert!(tv.visible(1).unwrap().iter().all(|&c| c == ColorSignal::Color(0x0e)));
    }

    #[test]
    fn test_wsync() {
        let mut tia = Tia::default();
        let mut tv = ScanlineRecorder::new();
        tia.step(30, &mut tv);
        tia.write(0x02, 0);
        assert!(tia.wsync_requested());
        tia.step_scanline(&mut tv);
        assert!(!tia.wsync_requested());
        assert_eq!(tia.clock(), 0);
        assert_eq!(tia.scanline(), 1);
    }

    #[test]
    fn test_rsync_restarts_scanline() {
        let mut tia = Tia::default();
        let mut tv = ScanlineRecorder::new();
        tia.video.player0.core.reset_pixel = 10;
        tia.step(100, &mut tv);
        tia.write(0x03, 0);
        assert_eq!(tia.clock(), 0);
        // 128 clocks short, so the sprite appears 128 columns further right
        assert_eq!(tia.video.player0.core.reset_pixel, 138);
    }

    #[test]
    fn test_unknown_and_audio_writes_ignored() {
        let mut tia = Tia::default();
        tia.write(0x2d, 0xff);
        tia.write(0x15, 0x0f);
        tia.write(0x3f, 0xff);
        assert_eq!(tia.video.playfield.background_color, 0);
    }

    #[test]
    fn test_read_collisions_and_inputs() {
        let mut tia = Tia::default();
        tia.video.collisions.tick(crate::collisions::Objects {
            m0: true,
            p1: true,
            ..Default::default()
        });
        assert_eq!(tia.read(0x00), 0x80);
        // mirrored
        assert_eq!(tia.read(0x30), 0x80);
        for port in crate::registers::INPT0..=crate::registers::INPT5 {
            assert_eq!(tia.read(port), 0x00);
        }

        tia.write(0x2c, 0);
        assert_eq!(tia.read(0x00), 0x00);
    }

    #[test]
    fn test_tv_horiz_pos() {
        let mut tia = Tia::default();
        let mut tv = vcs_core::television::NullTelevision;
        assert_eq!(tia.tv_horiz_pos(), 227 - 68);
        tia.step(69, &mut tv);
        assert_eq!(tia.tv_horiz_pos(), 0);
    }

    #[test]
    fn test_reset_in_place() {
        let mut tia = Tia::default();
        let mut tv = ScanlineRecorder::new();
        tia.write(0x06, 0x42);
        tia.write(0x0d, 0xf0);
        tia.write(0x10, 0);
        tia.step(500, &mut tv);

        tia.reset();

        assert_eq!(tia.video.player0.color, 0);
        assert_eq!(tia.video.playfield.pf0, 0);
        assert!(tia.video.player0.core.delay.is_empty());
        assert_eq!(tia.scanline(), 0);
        assert_eq!(tia.clock(), 0);
    }

    #[test]
    fn test_machine_info() {
        let tia = Tia::default();
        let info = tia.machine_info();
        assert!(info.starts_with("TIA: NTSC line 000 clock 000"));
        assert!(info.contains("Missile 0: 00 _*-- [000 > 0x0 > 000] | disb"));
        assert_eq!(info.lines().count(), 6);
    }
}
