//! Error types shared across ToyMovie crates.

use std::path::PathBuf;

/// Top-level error type for ToyMovie operations.
#[derive(Debug, thiserror::Error)]
pub enum ToymovieError {
    /// The live source has not reported its frame dimensions yet.
    #[error("Camera not ready: live source has no known dimensions yet")]
    CaptureNotReady,

    /// A capture was attempted while no sequence is loaded.
    #[error("No active sequence: open or create a sequence before capturing")]
    NoActiveSequence,

    #[error("Frame index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid frame rate {fps}: must be a positive, finite number")]
    InvalidFrameRate { fps: f64 },

    #[error("Failed to decode frame {ordinal}: {message}")]
    FrameDecode { ordinal: usize, message: String },

    #[error("Failed to encode frame: {message}")]
    FrameEncode { message: String },

    #[error("Live source error: {message}")]
    Source { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ToymovieError.
pub type ToymovieResult<T> = Result<T, ToymovieError>;

impl ToymovieError {
    pub fn frame_decode(ordinal: usize, msg: impl Into<String>) -> Self {
        Self::FrameDecode {
            ordinal,
            message: msg.into(),
        }
    }

    pub fn frame_encode(msg: impl Into<String>) -> Self {
        Self::FrameEncode {
            message: msg.into(),
        }
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error should be shown to the user as a message rather
    /// than treated as a programming fault.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::CaptureNotReady | Self::NoActiveSequence | Self::InvalidFrameRate { .. }
        )
    }
}
