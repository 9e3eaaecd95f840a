//! Centralized logging for the TIA core.
//!
//! # Architecture
//!
//! - **LogConfig**: Thread-safe global configuration using atomic operations
//! - **LogLevel**: Hierarchical log levels (Off < Error < Warn < Info < Debug < Trace)
//! - **LogCategory**: Chip areas that can be traced independently (Tia, Video, Hmove,
//!   Scheduler, Stubs)
//! - **log()**: Common logging function for all output with async file I/O
//!
//! # Performance
//!
//! The chip is ticked ~3.5 million times a second, so logging must cost nothing
//! when it is off:
//! - Messages are built by a closure that only runs when the category is enabled
//! - File output is handed to a background thread via a channel
//! - A per-category rate limiter stops a trace left on from flooding the output
//!
//! # Usage
//!
//! ```rust
//! use vcs_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Video, LogLevel::Trace, || {
//!     format!("RESP0 scheduled in {} ticks", 4)
//! });
//! ```

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// Log category for the different parts of the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Register writes and chip-level timing (scanlines, VSYNC, WSYNC)
    Tia,
    /// Sprite reset and drawing events
    Video,
    /// HMOVE strobes and clock stuffing
    Hmove,
    /// Delay queue diagnostics and invariant violations
    Scheduler,
    /// Registers that are accepted but do nothing in this core (audio, inputs)
    Stubs,
}

impl LogCategory {
    /// Number of categories
    pub const COUNT: usize = 5;

    /// Every category, in index order
    pub const ALL: [LogCategory; LogCategory::COUNT] = [
        LogCategory::Tia,
        LogCategory::Video,
        LogCategory::Hmove,
        LogCategory::Scheduler,
        LogCategory::Stubs,
    ];

    fn index(self) -> usize {
        match self {
            LogCategory::Tia => 0,
            LogCategory::Video => 1,
            LogCategory::Hmove => 2,
            LogCategory::Scheduler => 3,
            LogCategory::Stubs => 4,
        }
    }

    /// Parse a category name (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tia" => Some(LogCategory::Tia),
            "video" => Some(LogCategory::Video),
            "hmove" => Some(LogCategory::Hmove),
            "scheduler" | "delay" => Some(LogCategory::Scheduler),
            "stubs" | "stub" => Some(LogCategory::Stubs),
            _ => None,
        }
    }
}

/// Sliding-window rate limiter, one window per category
struct RateLimiter {
    max_logs_per_second: AtomicUsize,
    window_duration: Duration,
    timestamps: Mutex<[VecDeque<Instant>; LogCategory::COUNT]>,
    dropped_counts: Mutex<[usize; LogCategory::COUNT]>,
    last_drop_report: Mutex<[Option<Instant>; LogCategory::COUNT]>,
}

impl RateLimiter {
    fn new(max_logs_per_second: usize) -> Self {
        Self {
            max_logs_per_second: AtomicUsize::new(max_logs_per_second),
            window_duration: Duration::from_secs(1),
            timestamps: Mutex::new(Default::default()),
            dropped_counts: Mutex::new([0; LogCategory::COUNT]),
            last_drop_report: Mutex::new([None; LogCategory::COUNT]),
        }
    }

    fn set_max_logs_per_second(&self, max: usize) {
        self.max_logs_per_second.store(max, Ordering::Relaxed);
    }

    fn get_max_logs_per_second(&self) -> usize {
        self.max_logs_per_second.load(Ordering::Relaxed)
    }

    /// Returns (allowed, dropped_count) where dropped_count is Some(n) when a drop
    /// summary is due
    fn should_allow(&self, category: LogCategory) -> (bool, Option<usize>) {
        let now = Instant::now();
        let idx = category.index();

        // a poisoned lock only means another thread panicked mid-log; keep going
        let mut timestamps = self.timestamps.lock().unwrap_or_else(|e| e.into_inner());
        let mut dropped_counts = self.dropped_counts.lock().unwrap_or_else(|e| e.into_inner());
        let mut last_drop_report = self
            .last_drop_report
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let window = &mut timestamps[idx];
        while let Some(&front) = window.front() {
            if now.duration_since(front) > self.window_duration {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() < self.get_max_logs_per_second() {
            window.push_back(now);

            let dropped = dropped_counts[idx];
            if dropped > 0 {
                dropped_counts[idx] = 0;
                last_drop_report[idx] = Some(now);
                return (true, Some(dropped));
            }

            (true, None)
        } else {
            dropped_counts[idx] += 1;

            let should_report = match last_drop_report[idx] {
                None => true,
                Some(last) => now.duration_since(last) >= Duration::from_secs(1),
            };

            if should_report {
                let dropped = dropped_counts[idx];
                dropped_counts[idx] = 0;
                last_drop_report[idx] = Some(now);
                (false, Some(dropped))
            } else {
                (false, None)
            }
        }
    }
}

/// Global logging configuration
pub struct LogConfig {
    /// Applies to every category without its own level
    global_level: AtomicU8,
    /// Per-category levels, indexed by `LogCategory::index`
    levels: [AtomicU8; LogCategory::COUNT],
    log_sender: Mutex<Option<Sender<String>>>,
    file_logging_enabled: AtomicBool,
    rate_limiter: RateLimiter,
}

impl LogConfig {
    /// All logging disabled, 60 logs/second per category
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            levels: Default::default(),
            log_sender: Mutex::new(None),
            file_logging_enabled: AtomicBool::new(false),
            rate_limiter: RateLimiter::new(60),
        }
    }

    /// Get the global singleton instance
    pub fn global() -> &'static Self {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.levels[category.index()].load(Ordering::Relaxed))
    }

    /// A category with its own level uses it; a category left at Off falls back to
    /// the global level
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        let category_level = self.get_level(category);
        if category_level != LogLevel::Off {
            level <= category_level
        } else {
            level <= self.get_global_level()
        }
    }

    /// Reset all logging to Off
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for category in LogCategory::ALL {
            self.set_level(category, LogLevel::Off);
        }
    }

    /// Set the maximum logs per second per category
    pub fn set_rate_limit(&self, max_logs_per_second: usize) {
        self.rate_limiter
            .set_max_logs_per_second(max_logs_per_second);
    }

    pub fn get_rate_limit(&self) -> usize {
        self.rate_limiter.get_max_logs_per_second()
    }

    /// Send log output to a file.
    ///
    /// A background thread does the writing so a chatty trace never stalls the
    /// tick loop. Any previous writer thread stops when its sender is replaced.
    pub fn set_log_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let (sender, receiver) = channel::<String>();

        thread::Builder::new()
            .name("tia-log-writer".to_string())
            .spawn(move || {
                let mut file = file;
                while let Ok(message) = receiver.recv() {
                    let _ = writeln!(file, "{}", message);
                    let _ = file.flush();
                }
                let _ = file.flush();
            })?;

        let mut log_sender = self.log_sender.lock().unwrap_or_else(|e| e.into_inner());
        *log_sender = Some(sender);
        self.file_logging_enabled.store(true, Ordering::Relaxed);

        Ok(())
    }

    /// Stop logging to file and go back to stderr
    pub fn clear_log_file(&self) {
        let mut log_sender = self.log_sender.lock().unwrap_or_else(|e| e.into_inner());
        *log_sender = None;
        self.file_logging_enabled.store(false, Ordering::Relaxed);
    }

    fn write_message(&self, message: &str) {
        if self.file_logging_enabled.load(Ordering::Relaxed) {
            let log_sender = self.log_sender.lock().unwrap_or_else(|e| e.into_inner());
            match log_sender.as_ref() {
                Some(sender) if sender.send(message.to_string()).is_ok() => {}
                _ => eprintln!("{}", message),
            }
        } else {
            eprintln!("{}", message);
        }
    }
}

/// Log a message with the specified category and level
///
/// The message closure only runs when the category is enabled at `level` and the
/// rate limiter lets the message through. When messages have been dropped a
/// one-line summary is written before the next one that is allowed.
///
/// ```rust
/// use vcs_core::logging::{log, LogCategory, LogLevel};
///
/// log(LogCategory::Hmove, LogLevel::Debug, || {
///     format!("HMOVE strobed at clock {}", 3)
/// });
/// ```
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    let config = LogConfig::global();
    if config.should_log(category, level) {
        let (allowed, dropped_count) = config.rate_limiter.should_allow(category);

        if let Some(count) = dropped_count {
            if count > 0 {
                let warning = format!(
                    "[{:?}] WARNING: Rate limit exceeded, {} log message(s) dropped in the last second",
                    category, count
                );
                config.write_message(&warning);
            }
        }

        if allowed {
            let message = message_fn();
            config.write_message(&format!("[{:?}] {}", category, message));
        }
    }
}
