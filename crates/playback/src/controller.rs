//! Playback state machine over a frame sequence.
//!
//! Two states, `Paused` (initial) and `Playing`. While playing, a single
//! periodic timer advances the current index by one frame per interval,
//! wrapping at the end of the sequence.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use toymovie_common::clock::{Clock, FrameInterval};
use toymovie_common::config::PlaybackDefaults;
use toymovie_common::error::{ToymovieError, ToymovieResult};
use toymovie_frame_store::{Frame, FrameStore};

use crate::timer::PlaybackTimer;

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Paused,
    Playing,
}

/// Current index / length pair for position display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackPosition {
    pub index: usize,
    pub len: usize,
}

impl fmt::Display for PlaybackPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len == 0 {
            write!(f, "0 / 0")
        } else {
            write!(f, "{} / {}", self.index + 1, self.len)
        }
    }
}

/// Steps through a [`FrameStore`] on a timer.
///
/// The store is passed in on every call rather than owned, so the capture
/// side can keep appending to it. After mutating the store, callers must
/// call [`PlaybackController::refresh`] (or [`PlaybackController::show_latest`]).
pub struct PlaybackController {
    clock: Arc<dyn Clock>,
    fps: f64,
    interval: FrameInterval,
    current_index: usize,
    timer: Option<PlaybackTimer>,
    timers_started: u64,
}

impl PlaybackController {
    /// Create a paused controller at index 0.
    pub fn new(clock: Arc<dyn Clock>, fps: f64) -> ToymovieResult<Self> {
        let interval = FrameInterval::from_fps(fps).ok_or(ToymovieError::InvalidFrameRate { fps })?;
        Ok(Self {
            clock,
            fps,
            interval,
            current_index: 0,
            timer: None,
            timers_started: 0,
        })
    }

    pub fn from_defaults(clock: Arc<dyn Clock>, defaults: &PlaybackDefaults) -> ToymovieResult<Self> {
        Self::new(clock, defaults.fps)
    }

    pub fn state(&self) -> PlaybackState {
        if self.timer.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_some()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn frames_per_second(&self) -> f64 {
        self.fps
    }

    pub fn interval(&self) -> FrameInterval {
        self.interval
    }

    /// Id of the active timer, if playing. Stays the same until the timer
    /// is cancelled or replaced.
    pub fn timer_id(&self) -> Option<u64> {
        self.timer.as_ref().map(PlaybackTimer::id)
    }

    /// Start playing. Returns `true` if playback started.
    ///
    /// Does nothing on an empty sequence or when already playing.
    pub fn play(&mut self, store: &FrameStore) -> bool {
        if store.is_empty() {
            tracing::debug!("Ignoring play: sequence is empty");
            return false;
        }
        if self.timer.is_some() {
            return false;
        }
        self.start_timer();
        tracing::info!(
            fps = self.fps,
            interval_ms = self.interval.as_millis_f64(),
            "Playback started"
        );
        true
    }

    /// Stop playing. Returns `true` if playback was running.
    pub fn pause(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                tracing::info!(timer = timer.id(), index = self.current_index, "Playback paused");
                true
            }
            None => false,
        }
    }

    /// Play if paused, pause if playing. Returns the new state.
    pub fn toggle(&mut self, store: &FrameStore) -> PlaybackState {
        if self.is_playing() {
            self.pause();
        } else {
            self.play(store);
        }
        self.state()
    }

    /// Move by `delta` frames, wrapping around the sequence.
    ///
    /// Does not change play state; pause first for a manual step.
    pub fn step(&mut self, store: &FrameStore, delta: isize) {
        let len = store.len();
        if len == 0 {
            return;
        }
        let len = len as isize;
        let index = (self.current_index as isize).rem_euclid(len);
        self.current_index = (index + delta.rem_euclid(len)).rem_euclid(len) as usize;
    }

    /// Jump to `index`, clamped into the sequence. Does not change play state.
    pub fn scrub_to(&mut self, store: &FrameStore, index: isize) {
        let len = store.len();
        if len == 0 {
            return;
        }
        self.current_index = index.clamp(0, len as isize - 1) as usize;
    }

    /// Change the rate. Non-positive or non-finite rates are rejected and
    /// the previous rate stays in effect. A running timer is replaced by
    /// one at the new interval, starting now.
    pub fn set_frame_rate(&mut self, fps: f64) -> ToymovieResult<()> {
        let interval = FrameInterval::from_fps(fps).ok_or(ToymovieError::InvalidFrameRate { fps })?;
        self.fps = fps;
        self.interval = interval;
        if self.timer.is_some() {
            self.start_timer();
        }
        tracing::debug!(fps, playing = self.is_playing(), "Frame rate changed");
        Ok(())
    }

    /// A new sequence was loaded: pause and go back to the first frame.
    pub fn load(&mut self, store: &FrameStore) {
        self.pause();
        self.current_index = 0;
        tracing::debug!(len = store.len(), "Playback reset for new sequence");
    }

    /// The sequence was unloaded: pause and forget the position.
    pub fn unload(&mut self) {
        self.pause();
        self.current_index = 0;
    }

    /// Re-sync with the store after it changed. An empty sequence forces
    /// pause and index 0; otherwise the index is clamped.
    pub fn refresh(&mut self, store: &FrameStore) {
        let len = store.len();
        if len == 0 {
            self.pause();
            self.current_index = 0;
            return;
        }
        self.current_index = self.current_index.min(len - 1);
    }

    /// Show the newest frame, e.g. right after a capture.
    pub fn show_latest(&mut self, store: &FrameStore) {
        self.refresh(store);
        if !store.is_empty() {
            self.current_index = store.len() - 1;
        }
    }

    /// Poll the timer. Advances one frame if a tick is due and returns
    /// whether it did.
    pub fn tick(&mut self, store: &FrameStore) -> bool {
        let now = self.clock.now_ns();
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        if !timer.fire(now) {
            return false;
        }
        if store.is_empty() {
            self.refresh(store);
            return false;
        }
        self.step(store, 1);
        tracing::trace!(index = self.current_index, "Playback advanced");
        true
    }

    /// Clock timestamp of the next tick, if playing.
    pub fn next_deadline_ns(&self) -> Option<u64> {
        self.timer.as_ref().map(PlaybackTimer::next_due_ns)
    }

    /// How long until the next tick is due, if playing. Zero when overdue.
    pub fn time_until_next_tick(&self) -> Option<Duration> {
        let now = self.clock.now_ns();
        self.next_deadline_ns()
            .map(|due| Duration::from_nanos(due.saturating_sub(now)))
    }

    /// The frame at the current index.
    pub fn current_frame<'a>(&self, store: &'a FrameStore) -> Option<&'a Frame> {
        let last = store.len().checked_sub(1)?;
        store.frames().get(self.current_index.min(last))
    }

    pub fn position(&self, store: &FrameStore) -> PlaybackPosition {
        let len = store.len();
        PlaybackPosition {
            index: if len == 0 {
                0
            } else {
                self.current_index.min(len - 1)
            },
            len,
        }
    }

    /// Replace any timer with a fresh one. The old handle is dropped first,
    /// so two timers never coexist.
    fn start_timer(&mut self) {
        self.timer = None;
        self.timers_started += 1;
        let now = self.clock.now_ns();
        self.timer = Some(PlaybackTimer::start(self.timers_started, self.interval, now));
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("fps", &self.fps)
            .field("current_index", &self.current_index)
            .field("timer", &self.timer)
            .finish()
    }
}
