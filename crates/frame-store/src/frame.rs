//! Captured frames and their encoded payloads.

use std::io::Cursor;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageReader, RgbaImage};
use serde::Serialize;

use toymovie_common::config::FrameEncoding;
use toymovie_common::error::{ToymovieError, ToymovieResult};

/// Encoded still image bytes (JPEG or PNG).
///
/// Cloning is cheap: the bytes are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePayload {
    bytes: Arc<[u8]>,
}

impl FramePayload {
    /// Wrap already-encoded bytes, e.g. a frame restored by the project layer.
    /// The bytes are not validated until the frame is decoded.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Arc::from(bytes.into()),
        }
    }

    /// Encode an RGBA image. JPEG output drops the alpha channel.
    pub fn encode(image: &RgbaImage, encoding: FrameEncoding) -> ToymovieResult<Self> {
        let mut buf = Vec::new();
        let result = match encoding {
            FrameEncoding::Jpeg { quality } => {
                let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
                DynamicImage::ImageRgb8(rgb)
                    .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
            }
            FrameEncoding::Png => DynamicImage::ImageRgba8(image.clone())
                .write_with_encoder(PngEncoder::new(&mut buf)),
        };
        result.map_err(|e| ToymovieError::frame_encode(e.to_string()))?;
        Ok(Self::from_bytes(buf))
    }

    /// Raw encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encoded size in bytes.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    fn decode(&self) -> image::ImageResult<RgbaImage> {
        Ok(image::load_from_memory(&self.bytes)?.to_rgba8())
    }

    fn dimensions(&self) -> image::ImageResult<(u32, u32)> {
        ImageReader::new(Cursor::new(&self.bytes[..]))
            .with_guessed_format()?
            .into_dimensions()
    }
}

/// One captured still image in a sequence.
///
/// Frames are only created by [`crate::FrameStore`] and never change
/// afterwards; the ordinal is the frame's position in its sequence.
#[derive(Debug, Clone)]
pub struct Frame {
    ordinal: usize,
    captured_at: DateTime<Utc>,
    payload: FramePayload,
}

impl Frame {
    pub(crate) fn new(ordinal: usize, captured_at: DateTime<Utc>, payload: FramePayload) -> Self {
        Self {
            ordinal,
            captured_at,
            payload,
        }
    }

    /// Zero-based position in the sequence.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn payload(&self) -> &FramePayload {
        &self.payload
    }

    /// Decode the frame into RGBA pixels.
    pub fn decode(&self) -> ToymovieResult<RgbaImage> {
        self.payload
            .decode()
            .map_err(|e| ToymovieError::frame_decode(self.ordinal, e.to_string()))
    }

    /// Native pixel dimensions, read from the encoded header.
    pub fn dimensions(&self) -> ToymovieResult<(u32, u32)> {
        self.payload
            .dimensions()
            .map_err(|e| ToymovieError::frame_decode(self.ordinal, e.to_string()))
    }

    /// Lightweight description for logs and listings.
    pub fn summary(&self) -> FrameSummary {
        let (width, height) = self.dimensions().unwrap_or((0, 0));
        FrameSummary {
            ordinal: self.ordinal,
            captured_at: self.captured_at,
            width,
            height,
            bytes: self.payload.byte_len(),
        }
    }
}

/// Serializable metadata for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub ordinal: usize,
    pub captured_at: DateTime<Utc>,
    /// Zero when the payload header cannot be read.
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn test_png_payload_is_lossless() {
        let image = solid(4, 3, [10, 200, 30, 255]);
        let payload = FramePayload::encode(&image, FrameEncoding::Png).unwrap();
        let frame = Frame::new(0, Utc::now(), payload);

        assert_eq!(frame.decode().unwrap(), image);
        assert_eq!(frame.dimensions().unwrap(), (4, 3));
    }

    #[test]
    fn test_jpeg_payload_keeps_dimensions_and_is_opaque() {
        let image = solid(16, 8, [120, 60, 30, 128]);
        let payload = FramePayload::encode(&image, FrameEncoding::Jpeg { quality: 90 }).unwrap();
        let frame = Frame::new(2, Utc::now(), payload);

        let decoded = frame.decode().unwrap();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert!(decoded.pixels().all(|p| p.0[3] == 255));
        let px = decoded.get_pixel(8, 4).0;
        assert!((px[0] as i32 - 120).abs() <= 4);
    }

    #[test]
    fn test_corrupt_payload_reports_ordinal() {
        let frame = Frame::new(7, Utc::now(), FramePayload::from_bytes(b"not an image".to_vec()));
        match frame.decode() {
            Err(ToymovieError::FrameDecode { ordinal, .. }) => assert_eq!(ordinal, 7),
            other => panic!("expected decode failure, got {other:?}"),
        }
        assert_eq!(frame.summary().width, 0);
    }

    #[test]
    fn test_payload_clone_shares_bytes() {
        let payload = FramePayload::from_bytes(vec![1, 2, 3]);
        let copy = payload.clone();
        assert_eq!(payload, copy);
        assert_eq!(copy.byte_len(), 3);
        assert!(std::ptr::eq(payload.as_bytes(), copy.as_bytes()));
    }
}
