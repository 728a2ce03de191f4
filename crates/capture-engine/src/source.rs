//! Live image sources.
//!
//! The capture engine does not talk to camera devices. A [`LiveSource`]
//! hands over frames that were already decoded elsewhere.

use std::path::Path;
use std::sync::{Arc, Mutex};

use image::RgbaImage;

use toymovie_common::error::{ToymovieError, ToymovieResult};

/// A live feed the session can preview and capture from.
pub trait LiveSource: Send {
    /// Native frame size, `(0, 0)` until the source is ready.
    fn intrinsic_size(&self) -> (u32, u32);

    /// The current image at native resolution.
    fn snapshot(&self) -> ToymovieResult<RgbaImage>;

    /// Whether the native size is known and non-zero.
    fn is_ready(&self) -> bool {
        let (width, height) = self.intrinsic_size();
        width > 0 && height > 0
    }
}

/// A fixed image standing in for the camera.
#[derive(Debug, Clone)]
pub struct StillImageSource {
    image: RgbaImage,
}

impl StillImageSource {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Load the feed image from disk.
    pub fn open(path: &Path) -> ToymovieResult<Self> {
        if !path.exists() {
            return Err(ToymovieError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let image = image::open(path)
            .map_err(|e| ToymovieError::source(format!("Failed to open {path:?}: {e}")))?
            .to_rgba8();
        Ok(Self::new(image))
    }
}

impl LiveSource for StillImageSource {
    fn intrinsic_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn snapshot(&self) -> ToymovieResult<RgbaImage> {
        Ok(self.image.clone())
    }
}

/// A source fed by another component (e.g. a camera thread) through a
/// [`FramePublisher`]. Not ready until the first frame is published.
#[derive(Debug, Clone, Default)]
pub struct SharedFrameSource {
    slot: Arc<Mutex<Option<RgbaImage>>>,
}

/// Write side of a [`SharedFrameSource`].
#[derive(Debug, Clone)]
pub struct FramePublisher {
    slot: Arc<Mutex<Option<RgbaImage>>>,
}

impl SharedFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that replaces the current frame.
    pub fn publisher(&self) -> FramePublisher {
        FramePublisher {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl FramePublisher {
    pub fn publish(&self, image: RgbaImage) {
        match self.slot.lock() {
            Ok(mut slot) => *slot = Some(image),
            Err(poisoned) => *poisoned.into_inner() = Some(image),
        }
    }
}

impl LiveSource for SharedFrameSource {
    fn intrinsic_size(&self) -> (u32, u32) {
        match self.slot.lock() {
            Ok(slot) => slot.as_ref().map(RgbaImage::dimensions).unwrap_or((0, 0)),
            Err(_) => (0, 0),
        }
    }

    fn snapshot(&self) -> ToymovieResult<RgbaImage> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| ToymovieError::source("frame slot lock poisoned"))?;
        slot.clone().ok_or(ToymovieError::CaptureNotReady)
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    #[test]
    fn test_still_source_is_ready() {
        let source = StillImageSource::new(RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255])));
        assert!(source.is_ready());
        assert_eq!(source.intrinsic_size(), (4, 2));
        assert_eq!(source.snapshot().unwrap().dimensions(), (4, 2));
    }

    #[test]
    fn test_empty_still_image_is_not_ready() {
        let source = StillImageSource::new(RgbaImage::new(0, 0));
        assert!(!source.is_ready());
    }

    #[test]
    fn test_shared_source_ready_after_publish() {
        let source = SharedFrameSource::new();
        assert!(!source.is_ready());
        assert!(matches!(
            source.snapshot(),
            Err(ToymovieError::CaptureNotReady)
        ));

        let publisher = source.publisher();
        let handle = std::thread::spawn(move || {
            publisher.publish(RgbaImage::from_pixel(8, 6, Rgba([0, 0, 0, 255])));
        });
        handle.join().unwrap();

        assert!(source.is_ready());
        assert_eq!(source.intrinsic_size(), (8, 6));
    }

    #[test]
    fn test_open_missing_file() {
        let err = StillImageSource::open(Path::new("/nonexistent/live.png")).unwrap_err();
        assert!(matches!(err, ToymovieError::FileNotFound { .. }));
    }
}
