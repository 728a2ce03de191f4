//! Single-frame capture: snapshot the live source and encode it.

use serde::Serialize;

use toymovie_common::config::FrameEncoding;
use toymovie_common::error::{ToymovieError, ToymovieResult};
use toymovie_frame_store::FramePayload;

use crate::source::LiveSource;

/// Runtime statistics from a capture pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureStats {
    /// Frames captured.
    pub frames_captured: u64,

    /// Frames removed again by undo.
    pub frames_undone: u64,

    /// Capture attempts refused because the source was not ready.
    pub not_ready: u64,

    /// Total encoded payload bytes produced.
    pub bytes_encoded: u64,
}

/// Turns the current live image into a frame payload.
#[derive(Debug, Clone)]
pub struct CapturePipeline {
    encoding: FrameEncoding,
    stats: CaptureStats,
}

impl CapturePipeline {
    pub fn new(encoding: FrameEncoding) -> Self {
        Self {
            encoding,
            stats: CaptureStats::default(),
        }
    }

    pub fn encoding(&self) -> FrameEncoding {
        self.encoding
    }

    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }

    /// The source's native size, or `CaptureNotReady` while it is unknown.
    pub fn ensure_ready(&mut self, source: &dyn LiveSource) -> ToymovieResult<(u32, u32)> {
        let (width, height) = source.intrinsic_size();
        if width == 0 || height == 0 {
            self.stats.not_ready += 1;
            return Err(ToymovieError::CaptureNotReady);
        }
        Ok((width, height))
    }

    /// Snapshot the source at its native resolution and encode it.
    pub fn snapshot(&mut self, source: &dyn LiveSource) -> ToymovieResult<FramePayload> {
        let (width, height) = self.ensure_ready(source)?;
        let image = source.snapshot()?;
        if image.dimensions() != (width, height) {
            tracing::debug!(
                reported = ?(width, height),
                actual = ?image.dimensions(),
                "Live source size changed between probe and snapshot"
            );
        }
        let payload = FramePayload::encode(&image, self.encoding)?;
        self.stats.frames_captured += 1;
        self.stats.bytes_encoded += payload.byte_len() as u64;
        Ok(payload)
    }

    /// Record that a captured frame was undone.
    pub fn record_undo(&mut self) {
        self.stats.frames_undone += 1;
    }
}
