//! Clock and timing utilities for playback scheduling.
//!
//! Playback timers never read the system clock directly. They go through
//! the [`Clock`] trait so that:
//! - interactive sessions use a monotonic clock anchored at creation
//! - tests and scripted runs drive time by hand with [`ManualClock`]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic nanosecond timestamps.
pub trait Clock: Send + Sync {
    /// Nanoseconds since the clock's epoch. Never decreases.
    fn now_ns(&self) -> u64;
}

/// A monotonic clock that provides timestamps relative to the moment it
/// was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for MonotonicClock {
    fn now_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ns: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now_ns
            .fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Move time forward by whole milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }
}

/// Period between frames at a given rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInterval {
    interval_ns: u64,
}

impl FrameInterval {
    /// Interval for the given frames per second (`1000 / fps` ms).
    /// Returns `None` for non-positive or non-finite rates.
    pub fn from_fps(fps: f64) -> Option<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return None;
        }
        let interval_ns = (1_000_000_000.0 / fps).round().max(1.0) as u64;
        Some(Self { interval_ns })
    }

    /// Interval in nanoseconds.
    pub fn as_ns(&self) -> u64 {
        self.interval_ns
    }

    /// Interval in milliseconds.
    pub fn as_millis_f64(&self) -> f64 {
        self.interval_ns as f64 / 1_000_000.0
    }
}
