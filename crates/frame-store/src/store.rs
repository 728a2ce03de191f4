//! The ordered frame sequence of one stop-motion project.

use chrono::{DateTime, Utc};

use toymovie_common::error::{ToymovieError, ToymovieResult};

use crate::frame::{Frame, FramePayload};

/// Ordered list of captured frames.
///
/// Insertion order is temporal order is playback order. Frames can only
/// be removed from the tail or all at once, so ordinals always equal
/// positions. The store is a plain data holder: callers refresh any
/// preview or player view after mutating it.
#[derive(Debug, Clone, Default)]
pub struct FrameStore {
    frames: Vec<Frame>,
}

impl FrameStore {
    /// An empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from payloads supplied by the project layer, in order.
    pub fn from_payloads(payloads: impl IntoIterator<Item = FramePayload>) -> Self {
        let mut store = Self::new();
        for payload in payloads {
            store.append(payload);
        }
        store
    }

    /// Append a frame captured now. Returns the new length.
    pub fn append(&mut self, payload: FramePayload) -> usize {
        self.append_at(payload, Utc::now())
    }

    /// Append a frame with an explicit capture time. Returns the new length.
    pub fn append_at(&mut self, payload: FramePayload, captured_at: DateTime<Utc>) -> usize {
        let ordinal = self.frames.len();
        self.frames.push(Frame::new(ordinal, captured_at, payload));
        self.frames.len()
    }

    /// Remove the tail frame. Does nothing on an empty store.
    pub fn remove_last(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Remove every frame.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`, or `IndexOutOfRange`.
    pub fn at(&self, index: usize) -> ToymovieResult<&Frame> {
        self.frames.get(index).ok_or(ToymovieError::IndexOutOfRange {
            index,
            len: self.frames.len(),
        })
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// The last `min(n, len)` frames, oldest first.
    pub fn last_n(&self, n: usize) -> &[Frame] {
        let start = self.frames.len().saturating_sub(n);
        &self.frames[start..]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}
