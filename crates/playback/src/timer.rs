//! Cancellable periodic timer polled by the host event loop.

use toymovie_common::clock::FrameInterval;

/// A running periodic timer.
///
/// The timer does not fire by itself: the owner polls [`PlaybackTimer::fire`]
/// with the current time. Dropping the handle cancels it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackTimer {
    id: u64,
    interval: FrameInterval,
    next_due_ns: u64,
}

impl PlaybackTimer {
    /// Start a timer whose first tick is one interval after `now_ns`.
    pub fn start(id: u64, interval: FrameInterval, now_ns: u64) -> Self {
        Self {
            id,
            interval,
            next_due_ns: now_ns.saturating_add(interval.as_ns()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn interval(&self) -> FrameInterval {
        self.interval
    }

    /// Timestamp of the next tick.
    pub fn next_due_ns(&self) -> u64 {
        self.next_due_ns
    }

    pub fn is_due(&self, now_ns: u64) -> bool {
        now_ns >= self.next_due_ns
    }

    /// Consume one tick if due. Returns `true` when the tick fired.
    ///
    /// At most one tick fires per call. If the poll came so late that
    /// further ticks were missed, they are dropped and the schedule restarts
    /// from `now_ns`.
    pub fn fire(&mut self, now_ns: u64) -> bool {
        if !self.is_due(now_ns) {
            return false;
        }
        self.next_due_ns = self.next_due_ns.saturating_add(self.interval.as_ns());
        if self.next_due_ns <= now_ns {
            self.next_due_ns = now_ns.saturating_add(self.interval.as_ns());
        }
        true
    }
}
