//! Overlay configuration: how many ghost frames, and how strong.

use serde::{Deserialize, Serialize};

use toymovie_common::config::OverlayDefaults;

/// User-adjustable onion-skin parameters.
///
/// Read fresh on every redraw; no history is kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    count: u32,
    opacity: f32,
    max_count: Option<u32>,
}

impl OverlayConfig {
    /// Create a configuration, clamping inputs into their valid ranges.
    pub fn new(count: u32, opacity: f32) -> Self {
        let mut config = Self {
            count: 0,
            opacity: 0.0,
            max_count: None,
        };
        config.set_count(count);
        config.set_opacity(opacity);
        config
    }

    pub fn from_defaults(defaults: &OverlayDefaults) -> Self {
        let mut config = Self::new(defaults.count, defaults.opacity);
        config.set_max_count(defaults.max_count);
        config
    }

    /// Number of most recent frames to ghost.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Opacity of the newest ghost frame, in `[0.0, 1.0]`.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn max_count(&self) -> Option<u32> {
        self.max_count
    }

    /// Set the ghost count, limited by the configured maximum if any.
    /// Returns the value actually stored.
    pub fn set_count(&mut self, count: u32) -> u32 {
        self.count = match self.max_count {
            Some(max) => count.min(max),
            None => count,
        };
        self.count
    }

    /// Set the base opacity. Values outside `[0, 1]` are clamped; NaN becomes 0.
    /// Returns the value actually stored.
    pub fn set_opacity(&mut self, opacity: f32) -> f32 {
        self.opacity = if opacity.is_nan() {
            0.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
        self.opacity
    }

    /// Change the upper bound; the current count is re-clamped.
    pub fn set_max_count(&mut self, max_count: Option<u32>) {
        self.max_count = max_count;
        self.set_count(self.count);
    }

    /// Number of frames actually ghosted for a sequence of `len` frames.
    pub fn effective_count(&self, len: usize) -> usize {
        (self.count as usize).min(len)
    }

    /// Alpha of the ghost at `position` (0 = oldest) among `count` ghosts.
    ///
    /// A linear ramp: the newest ghost gets the full opacity, the oldest
    /// gets `opacity / count`.
    pub fn blend_factor(&self, position: usize, count: usize) -> f32 {
        if count == 0 {
            return 0.0;
        }
        self.opacity * (position + 1) as f32 / count as f32
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self::from_defaults(&OverlayDefaults::default())
    }
}
