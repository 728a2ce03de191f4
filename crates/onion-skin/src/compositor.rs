//! Onion-skin compositor: blends the most recent frames over the live view.
//!
//! For `count = min(overlay_count, len)` ghosts, the frame at position `i`
//! (0 = oldest of the selected tail) is drawn with alpha
//! `opacity * (i + 1) / count`, oldest first, so the newest frame ends up
//! on top at full configured opacity.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use toymovie_common::config::PreviewDefaults;
use toymovie_frame_store::FrameStore;

use crate::blend::{fit_to, over_in_place};
use crate::overlay::OverlayConfig;

/// On-screen size of the live view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

impl DisplaySize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Replace zero dimensions with the fallback's.
    pub fn or_fallback(self, fallback: DisplaySize) -> DisplaySize {
        DisplaySize {
            width: if self.width == 0 {
                fallback.width
            } else {
                self.width
            },
            height: if self.height == 0 {
                fallback.height
            } else {
                self.height
            },
        }
    }
}

impl From<&PreviewDefaults> for DisplaySize {
    fn from(defaults: &PreviewDefaults) -> Self {
        Self::new(defaults.fallback_width, defaults.fallback_height)
    }
}

/// What caused a redraw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawReason {
    Capture,
    Undo,
    Clear,
    SequenceLoaded,
    OverlayChanged,
    Resize,
    LiveFrame,
}

/// One ghost frame in a composite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GhostLayer {
    /// Ordinal of the frame in the sequence.
    pub ordinal: usize,
    /// Position within the selected tail (0 = oldest).
    pub position: usize,
    /// Alpha used when drawing the frame.
    pub blend: f32,
}

/// The ghost layers for the current sequence and overlay settings, in draw
/// order.
pub fn ghost_layers(store: &FrameStore, config: &OverlayConfig) -> Vec<GhostLayer> {
    let count = config.effective_count(store.len());
    store
        .last_n(count)
        .iter()
        .enumerate()
        .map(|(position, frame)| GhostLayer {
            ordinal: frame.ordinal(),
            position,
            blend: config.blend_factor(position, count),
        })
        .collect()
}

/// Result of one composite.
#[derive(Debug, Clone)]
pub struct Composite {
    /// The blended preview, sized to the display.
    pub image: RgbaImage,
    /// Layers that were drawn, in draw order.
    pub drawn: Vec<GhostLayer>,
    /// Ordinals of frames that could not be decoded and were left out.
    pub skipped: Vec<usize>,
}

/// Blend the ghost frames over `live`, producing a `size` image.
///
/// Every input is stretched to `size`. A frame that fails to decode is
/// skipped and the remaining frames are still drawn.
pub fn compose(
    live: &RgbaImage,
    store: &FrameStore,
    config: &OverlayConfig,
    size: DisplaySize,
) -> Composite {
    let mut image = fit_to(live, size.width, size.height);
    let mut drawn = Vec::new();
    let mut skipped = Vec::new();

    for layer in ghost_layers(store, config) {
        if layer.blend <= 0.0 {
            continue;
        }
        // Layers come from the store's own tail, so the lookup cannot miss.
        let Some(frame) = store.frames().get(layer.ordinal) else {
            continue;
        };
        match frame.decode() {
            Ok(pixels) => {
                let pixels = fit_to(&pixels, size.width, size.height);
                over_in_place(&mut image, &pixels, layer.blend);
                drawn.push(layer);
            }
            Err(e) => {
                tracing::warn!(ordinal = layer.ordinal, error = %e, "Skipping undecodable ghost frame");
                skipped.push(layer.ordinal);
            }
        }
    }

    Composite {
        image,
        drawn,
        skipped,
    }
}

/// Owns the preview surface and coalesces redraw requests.
///
/// Triggers (capture, undo, slider changes, resize) mark the preview dirty;
/// the next render composites once no matter how many triggers arrived.
#[derive(Debug)]
pub struct OnionSkinCompositor {
    display: DisplaySize,
    fallback: DisplaySize,
    pending: Option<RedrawReason>,
    last: Option<Composite>,
    renders: u64,
}

impl OnionSkinCompositor {
    pub fn new(display: DisplaySize, fallback: DisplaySize) -> Self {
        Self {
            display,
            fallback,
            pending: Some(RedrawReason::SequenceLoaded),
            last: None,
            renders: 0,
        }
    }

    pub fn from_defaults(defaults: &PreviewDefaults) -> Self {
        let fallback = DisplaySize::from(defaults);
        Self::new(fallback, fallback)
    }

    /// Size the next composite will have.
    pub fn surface_size(&self) -> DisplaySize {
        self.display.or_fallback(self.fallback)
    }

    /// Update the display area; marks the preview dirty when it changed.
    pub fn set_display_size(&mut self, display: DisplaySize) {
        if display != self.display {
            self.display = display;
            self.invalidate(RedrawReason::Resize);
        }
    }

    /// Request a redraw. Returns `true` if this is the first pending request.
    pub fn invalidate(&mut self, reason: RedrawReason) -> bool {
        if self.pending.is_some() {
            tracing::trace!(?reason, "Redraw already pending");
            return false;
        }
        self.pending = Some(reason);
        true
    }

    pub fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_reason(&self) -> Option<RedrawReason> {
        self.pending
    }

    /// Composite now, regardless of the dirty flag.
    pub fn render(
        &mut self,
        live: &RgbaImage,
        store: &FrameStore,
        config: &OverlayConfig,
    ) -> &Composite {
        let reason = self.pending.take();
        let size = self.surface_size();
        let composite = compose(live, store, config, size);
        self.renders += 1;
        tracing::debug!(
            ?reason,
            width = size.width,
            height = size.height,
            ghosts = composite.drawn.len(),
            skipped = composite.skipped.len(),
            "Composited onion-skin preview"
        );
        self.last.insert(composite)
    }

    /// Composite only if a redraw was requested since the last render.
    pub fn render_if_dirty(
        &mut self,
        live: &RgbaImage,
        store: &FrameStore,
        config: &OverlayConfig,
    ) -> Option<&Composite> {
        if !self.is_dirty() {
            return None;
        }
        Some(self.render(live, store, config))
    }

    /// The most recent composite, if any.
    pub fn last(&self) -> Option<&Composite> {
        self.last.as_ref()
    }

    /// Number of composites produced so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;
    use toymovie_common::config::FrameEncoding;
    use toymovie_frame_store::FramePayload;

    use super::*;

    const LIVE: [u8; 4] = [0, 0, 0, 255];

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    fn png(color: [u8; 4]) -> FramePayload {
        FramePayload::encode(&solid(4, 4, color), FrameEncoding::Png).unwrap()
    }

    fn store_of(colors: &[[u8; 4]]) -> FrameStore {
        FrameStore::from_payloads(colors.iter().copied().map(png))
    }

    #[test]
    fn test_zero_count_returns_live_unmodified() {
        let live = RgbaImage::from_fn(4, 4, |x, y| Rgba([x as u8 * 10, y as u8 * 20, 5, 255]));
        let store = store_of(&[[255, 0, 0, 255], [0, 255, 0, 255]]);
        let config = OverlayConfig::new(0, 0.9);

        let composite = compose(&live, &store, &config, DisplaySize::new(4, 4));
        assert_eq!(composite.image, live);
        assert!(composite.drawn.is_empty());
    }

    #[test]
    fn test_zero_opacity_returns_live_unmodified() {
        let live = solid(4, 4, [30, 40, 50, 255]);
        let store = store_of(&[[255, 0, 0, 255]]);
        let config = OverlayConfig::new(3, 0.0);

        let composite = compose(&live, &store, &config, DisplaySize::new(4, 4));
        assert_eq!(composite.image, live);
    }

    #[test]
    fn test_count_clamps_to_sequence_length() {
        let store = store_of(&[[10, 0, 0, 255], [20, 0, 0, 255], [30, 0, 0, 255]]);
        let config = OverlayConfig::new(10, 0.9);

        let layers = ghost_layers(&store, &config);
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0].ordinal, 0);
        assert!((layers[0].blend - 0.3).abs() < 1e-6);
        assert_eq!(layers[2].ordinal, 2);
        assert!((layers[2].blend - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_newest_two_frames_ramp_up() {
        let store = store_of(&[[1, 0, 0, 255], [2, 0, 0, 255], [3, 0, 0, 255]]);
        let config = OverlayConfig::new(2, 0.6);

        let layers = ghost_layers(&store, &config);
        let ordinals: Vec<usize> = layers.iter().map(|l| l.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2]);
        assert!((layers[0].blend - 0.3).abs() < 1e-6);
        assert!((layers[1].blend - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_single_ghost_blends_at_full_opacity_setting() {
        let live = solid(4, 4, LIVE);
        let store = store_of(&[[200, 100, 50, 255]]);
        let config = OverlayConfig::new(1, 0.5);

        let composite = compose(&live, &store, &config, DisplaySize::new(4, 4));
        let px = composite.image.get_pixel(1, 1).0;
        assert!((px[0] as i32 - 100).abs() <= 1);
        assert!((px[1] as i32 - 50).abs() <= 1);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_newest_frame_dominates() {
        let live = solid(4, 4, LIVE);
        let store = store_of(&[[255, 0, 0, 255], [0, 0, 255, 255]]);
        let config = OverlayConfig::new(2, 1.0);

        let composite = compose(&live, &store, &config, DisplaySize::new(4, 4));
        let px = composite.image.get_pixel(0, 0).0;
        // Newest is drawn last at alpha 1.0, fully covering older ghosts.
        assert_eq!(px, [0, 0, 255, 255]);
    }

    #[test]
    fn test_output_is_scaled_to_display_size() {
        let live = solid(8, 6, LIVE);
        let store = store_of(&[[200, 200, 200, 255]]);
        let config = OverlayConfig::new(1, 1.0);

        let composite = compose(&live, &store, &config, DisplaySize::new(3, 5));
        assert_eq!(composite.image.dimensions(), (3, 5));
        assert_eq!(composite.image.get_pixel(2, 4).0, [200, 200, 200, 255]);
    }

    #[test]
    fn test_undecodable_frame_is_skipped_not_fatal() {
        let live = solid(4, 4, LIVE);
        let store = FrameStore::from_payloads([
            png([0, 255, 0, 255]),
            FramePayload::from_bytes(b"garbage".to_vec()),
            png([0, 0, 255, 255]),
        ]);
        let config = OverlayConfig::new(3, 0.9);

        let composite = compose(&live, &store, &config, DisplaySize::new(4, 4));
        assert_eq!(composite.skipped, vec![1]);
        let drawn: Vec<usize> = composite.drawn.iter().map(|l| l.ordinal).collect();
        assert_eq!(drawn, vec![0, 2]);
    }

    #[test]
    fn test_empty_display_uses_fallback_size() {
        let fallback = DisplaySize::new(300, 400);
        assert_eq!(DisplaySize::new(0, 0).or_fallback(fallback), fallback);
        assert_eq!(
            DisplaySize::new(640, 0).or_fallback(fallback),
            DisplaySize::new(640, 400)
        );

        let compositor = OnionSkinCompositor::new(DisplaySize::new(0, 0), fallback);
        assert_eq!(compositor.surface_size(), fallback);
    }

    #[test]
    fn test_redraw_requests_coalesce() {
        let live = solid(4, 4, LIVE);
        let store = store_of(&[[9, 9, 9, 255]]);
        let config = OverlayConfig::new(1, 0.5);
        let mut compositor =
            OnionSkinCompositor::new(DisplaySize::new(4, 4), DisplaySize::new(300, 400));

        assert!(compositor.render_if_dirty(&live, &store, &config).is_some());
        assert!(compositor.render_if_dirty(&live, &store, &config).is_none());

        assert!(compositor.invalidate(RedrawReason::OverlayChanged));
        assert!(!compositor.invalidate(RedrawReason::OverlayChanged));
        compositor.set_display_size(DisplaySize::new(2, 2));
        assert_eq!(
            compositor.pending_reason(),
            Some(RedrawReason::OverlayChanged)
        );

        let composite = compositor.render_if_dirty(&live, &store, &config).unwrap();
        assert_eq!(composite.image.dimensions(), (2, 2));
        assert_eq!(compositor.render_count(), 2);
        assert!(!compositor.is_dirty());
    }

    #[test]
    fn test_resize_to_same_size_does_not_dirty() {
        let mut compositor =
            OnionSkinCompositor::new(DisplaySize::new(4, 4), DisplaySize::new(300, 400));
        let live = solid(4, 4, LIVE);
        compositor.render(&live, &FrameStore::new(), &OverlayConfig::default());

        compositor.set_display_size(DisplaySize::new(4, 4));
        assert!(!compositor.is_dirty());
    }
}
