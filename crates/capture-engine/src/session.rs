//! Stop-motion session management.
//!
//! A session ties one live source to one active sequence and keeps the
//! onion-skin preview and the player in step with it. Every trigger
//! (capture, undo, slider change, resize) mutates the store first and
//! only then refreshes the views.

use std::ops::ControlFlow;
use std::sync::Arc;

use image::RgbaImage;

use toymovie_common::clock::Clock;
use toymovie_common::config::AppConfig;
use toymovie_common::error::{ToymovieError, ToymovieResult};
use toymovie_frame_store::{FramePayload, FrameStore};
use toymovie_onion_skin::{
    Composite, DisplaySize, OnionSkinCompositor, OverlayConfig, RedrawReason,
};
use toymovie_playback::{run_playback, PlaybackController, PlaybackPosition, PlaybackState};

use crate::pipeline::{CapturePipeline, CaptureStats};
use crate::source::LiveSource;

/// The sequence currently being worked on.
#[derive(Debug, Clone)]
pub struct ActiveSequence {
    /// Human-readable name, as shown by the project layer.
    pub name: String,

    /// Captured frames.
    pub frames: FrameStore,
}

/// A change to the active sequence, reported to the project layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceChange {
    /// A frame was appended at `ordinal`.
    Captured { ordinal: usize },
    /// The frame at `ordinal` was removed from the tail.
    Undone { ordinal: usize },
    /// All frames were removed.
    Cleared,
}

/// Callback invoked after every sequence mutation, once the preview and
/// player have been refreshed. Persisting the sequence is its job.
pub type SequenceListener = Box<dyn FnMut(&SequenceChange, &FrameStore) + Send>;

/// Orchestrates capture, onion-skin preview, and playback for one sequence.
pub struct StopMotionSession {
    source: Box<dyn LiveSource>,
    sequence: Option<ActiveSequence>,
    overlay: OverlayConfig,
    compositor: OnionSkinCompositor,
    playback: PlaybackController,
    pipeline: CapturePipeline,
    listener: Option<SequenceListener>,
}

impl StopMotionSession {
    /// Create a session with no active sequence.
    pub fn new(
        source: Box<dyn LiveSource>,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> ToymovieResult<Self> {
        Ok(Self {
            source,
            sequence: None,
            overlay: OverlayConfig::from_defaults(&config.overlay),
            compositor: OnionSkinCompositor::from_defaults(&config.preview),
            playback: PlaybackController::from_defaults(clock, &config.playback)?,
            pipeline: CapturePipeline::new(config.capture.encoding),
            listener: None,
        })
    }

    /// Register the project-layer callback.
    pub fn with_listener(mut self, listener: SequenceListener) -> Self {
        self.listener = Some(listener);
        self
    }

    // ------------------------------------------------------------------
    // Sequence lifecycle
    // ------------------------------------------------------------------

    /// Open a sequence supplied by the project layer, replacing any current one.
    pub fn open_sequence(
        &mut self,
        name: impl Into<String>,
        payloads: impl IntoIterator<Item = FramePayload>,
    ) {
        let sequence = ActiveSequence {
            name: name.into(),
            frames: FrameStore::from_payloads(payloads),
        };
        tracing::info!(name = %sequence.name, frames = sequence.frames.len(), "Sequence opened");
        self.playback.load(&sequence.frames);
        self.sequence = Some(sequence);
        self.redraw(RedrawReason::SequenceLoaded);
    }

    /// Start a new, empty sequence.
    pub fn new_sequence(&mut self, name: impl Into<String>) {
        self.open_sequence(name, std::iter::empty());
    }

    /// Drop the active sequence and its playback state.
    pub fn unload(&mut self) -> Option<ActiveSequence> {
        let sequence = self.sequence.take();
        if let Some(ref sequence) = sequence {
            tracing::info!(name = %sequence.name, "Sequence unloaded");
        }
        self.playback.unload();
        self.redraw(RedrawReason::SequenceLoaded);
        sequence
    }

    pub fn sequence(&self) -> Option<&ActiveSequence> {
        self.sequence.as_ref()
    }

    /// Frames of the active sequence, if any.
    pub fn frames(&self) -> Option<&FrameStore> {
        self.sequence.as_ref().map(|s| &s.frames)
    }

    pub fn frame_count(&self) -> usize {
        self.frames().map(FrameStore::len).unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Capture
    // ------------------------------------------------------------------

    /// Capture the current live image as a new frame. Returns the new length.
    ///
    /// Fails with `NoActiveSequence` or `CaptureNotReady` without touching
    /// anything. On success the preview is recomposited and the player
    /// jumps to the new frame.
    pub fn capture(&mut self) -> ToymovieResult<usize> {
        let Some(sequence) = self.sequence.as_mut() else {
            tracing::warn!("Capture refused: no active sequence");
            return Err(ToymovieError::NoActiveSequence);
        };
        let payload = match self.pipeline.snapshot(self.source.as_ref()) {
            Ok(payload) => payload,
            Err(e) if e.is_user_facing() => {
                tracing::warn!(error = %e, "Capture refused");
                return Err(e);
            }
            Err(e) => {
                tracing::error!(error = %e, "Capture failed");
                return Err(e);
            }
        };

        let len = sequence.frames.append(payload);
        let ordinal = len - 1;
        tracing::info!(name = %sequence.name, ordinal, total = len, "Frame captured");

        self.playback.show_latest(&sequence.frames);
        self.redraw(RedrawReason::Capture);
        self.notify(SequenceChange::Captured { ordinal });
        Ok(len)
    }

    /// Remove the last captured frame. Returns `false` when there was
    /// nothing to undo. Playback does not jump.
    pub fn undo(&mut self) -> bool {
        let Some(sequence) = self.sequence.as_mut() else {
            return false;
        };
        let Some(removed) = sequence.frames.remove_last() else {
            return false;
        };
        tracing::info!(
            ordinal = removed.ordinal(),
            remaining = sequence.frames.len(),
            "Frame undone"
        );

        self.pipeline.record_undo();
        self.playback.refresh(&sequence.frames);
        self.redraw(RedrawReason::Undo);
        self.notify(SequenceChange::Undone {
            ordinal: removed.ordinal(),
        });
        true
    }

    /// Remove every frame of the active sequence.
    pub fn clear_frames(&mut self) -> ToymovieResult<()> {
        let sequence = self
            .sequence
            .as_mut()
            .ok_or(ToymovieError::NoActiveSequence)?;
        sequence.frames.clear();
        tracing::info!(name = %sequence.name, "Sequence cleared");

        self.playback.refresh(&sequence.frames);
        self.redraw(RedrawReason::Clear);
        self.notify(SequenceChange::Cleared);
        Ok(())
    }

    pub fn capture_stats(&self) -> &CaptureStats {
        self.pipeline.stats()
    }

    // ------------------------------------------------------------------
    // Onion-skin preview
    // ------------------------------------------------------------------

    pub fn overlay(&self) -> &OverlayConfig {
        &self.overlay
    }

    /// Change the number of ghost frames. Returns the value in effect.
    pub fn set_overlay_count(&mut self, count: u32) -> u32 {
        let count = self.overlay.set_count(count);
        self.redraw(RedrawReason::OverlayChanged);
        count
    }

    /// Change the ghost opacity. Returns the value in effect.
    pub fn set_overlay_opacity(&mut self, opacity: f32) -> f32 {
        let opacity = self.overlay.set_opacity(opacity);
        self.redraw(RedrawReason::OverlayChanged);
        opacity
    }

    /// The live view's display area changed (e.g. rotation).
    pub fn resize_display(&mut self, size: DisplaySize) {
        self.compositor.set_display_size(size);
        if self.compositor.is_dirty() {
            self.render_preview_logged();
        }
    }

    /// Recomposite now if a redraw is pending. Returns `None` while the
    /// live source is not ready; the redraw stays pending.
    pub fn render_preview(&mut self) -> ToymovieResult<Option<&Composite>> {
        if !self.compositor.is_dirty() {
            return Ok(self.compositor.last());
        }
        if !self.source.is_ready() {
            tracing::debug!("Preview deferred: live source not ready");
            return Ok(None);
        }
        let live = self.source.snapshot()?;
        Ok(self.render_with(&live))
    }

    /// Recomposite against a fresh live image, e.g. on every camera frame.
    pub fn render_live_frame(&mut self, live: &RgbaImage) -> &Composite {
        self.compositor.invalidate(RedrawReason::LiveFrame);
        let empty = FrameStore::new();
        let frames = self.sequence.as_ref().map(|s| &s.frames).unwrap_or(&empty);
        self.compositor.render(live, frames, &self.overlay)
    }

    /// The last composited preview.
    pub fn preview(&self) -> Option<&Composite> {
        self.compositor.last()
    }

    pub fn compositor(&self) -> &OnionSkinCompositor {
        &self.compositor
    }

    fn render_with(&mut self, live: &RgbaImage) -> Option<&Composite> {
        let empty = FrameStore::new();
        let frames = self.sequence.as_ref().map(|s| &s.frames).unwrap_or(&empty);
        self.compositor.render_if_dirty(live, frames, &self.overlay)
    }

    fn redraw(&mut self, reason: RedrawReason) {
        self.compositor.invalidate(reason);
        self.render_preview_logged();
    }

    fn render_preview_logged(&mut self) {
        if let Err(e) = self.render_preview() {
            tracing::warn!(error = %e, "Preview refresh failed");
        }
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn play(&mut self) -> bool {
        match self.sequence.as_ref() {
            Some(sequence) => self.playback.play(&sequence.frames),
            None => false,
        }
    }

    pub fn pause(&mut self) -> bool {
        self.playback.pause()
    }

    pub fn toggle_play(&mut self) -> PlaybackState {
        match self.sequence.as_ref() {
            Some(sequence) => self.playback.toggle(&sequence.frames),
            None => self.playback.state(),
        }
    }

    pub fn step(&mut self, delta: isize) {
        if let Some(sequence) = self.sequence.as_ref() {
            self.playback.step(&sequence.frames, delta);
        }
    }

    /// Pause, then step: the player's previous/next buttons.
    pub fn step_paused(&mut self, delta: isize) {
        self.playback.pause();
        self.step(delta);
    }

    pub fn scrub_to(&mut self, index: isize) {
        if let Some(sequence) = self.sequence.as_ref() {
            self.playback.scrub_to(&sequence.frames, index);
        }
    }

    pub fn set_frame_rate(&mut self, fps: f64) -> ToymovieResult<()> {
        self.playback.set_frame_rate(fps)
    }

    /// Poll the playback timer. Returns whether the player advanced.
    pub fn tick(&mut self) -> bool {
        match self.sequence.as_ref() {
            Some(sequence) => self.playback.tick(&sequence.frames),
            None => false,
        }
    }

    pub fn playback_position(&self) -> PlaybackPosition {
        match self.sequence.as_ref() {
            Some(sequence) => self.playback.position(&sequence.frames),
            None => PlaybackPosition { index: 0, len: 0 },
        }
    }

    /// Decoded image of the current playback frame. `None` for an empty
    /// sequence or a frame that cannot be decoded.
    pub fn player_image(&self) -> Option<RgbaImage> {
        let frames = self.frames()?;
        let frame = self.playback.current_frame(frames)?;
        match frame.decode() {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!(ordinal = frame.ordinal(), error = %e, "Cannot show playback frame");
                None
            }
        }
    }

    /// Play in real time until `on_advance` breaks or playback stops.
    /// Starts playback if needed. Returns the number of frames advanced.
    pub async fn run_playback<F>(&mut self, on_advance: F) -> usize
    where
        F: FnMut(PlaybackPosition) -> ControlFlow<()>,
    {
        let Some(sequence) = self.sequence.as_ref() else {
            return 0;
        };
        self.playback.play(&sequence.frames);
        run_playback(&mut self.playback, &sequence.frames, on_advance).await
    }

    fn notify(&mut self, change: SequenceChange) {
        let (Some(listener), Some(sequence)) = (self.listener.as_mut(), self.sequence.as_ref())
        else {
            return;
        };
        listener(&change, &sequence.frames);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use image::Rgba;
    use toymovie_common::clock::ManualClock;
    use toymovie_common::config::FrameEncoding;

    use super::*;
    use crate::source::{SharedFrameSource, StillImageSource};

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.capture.encoding = FrameEncoding::Png;
        config
    }

    fn still(color: [u8; 4]) -> Box<dyn LiveSource> {
        Box::new(StillImageSource::new(RgbaImage::from_pixel(4, 4, Rgba(color))))
    }

    fn session_with(source: Box<dyn LiveSource>) -> (StopMotionSession, ManualClock) {
        let clock = ManualClock::new();
        let mut session =
            StopMotionSession::new(source, &test_config(), Arc::new(clock.clone())).unwrap();
        session.resize_display(DisplaySize::new(4, 4));
        (session, clock)
    }

    #[test]
    fn test_capture_without_sequence_is_refused() {
        let (mut session, _) = session_with(still([1, 1, 1, 255]));
        assert!(matches!(
            session.capture(),
            Err(ToymovieError::NoActiveSequence)
        ));
        assert_eq!(session.capture_stats().frames_captured, 0);
    }

    #[test]
    fn test_capture_before_camera_ready_is_refused() {
        let (mut session, _) = session_with(Box::new(SharedFrameSource::new()));
        session.new_sequence("Projekt 1");
        assert!(matches!(
            session.capture(),
            Err(ToymovieError::CaptureNotReady)
        ));
        assert_eq!(session.frame_count(), 0);
    }

    #[test]
    fn test_capture_appends_and_jumps_playback() {
        let (mut session, _) = session_with(still([10, 20, 30, 255]));
        session.new_sequence("test");

        assert_eq!(session.capture().unwrap(), 1);
        assert_eq!(session.capture().unwrap(), 2);
        assert_eq!(session.playback_position().to_string(), "2 / 2");

        let preview = session.preview().unwrap();
        assert_eq!(preview.drawn.len(), 2);
        assert_eq!(preview.image.dimensions(), (4, 4));
    }

    #[test]
    fn test_undo_refreshes_without_jumping() {
        let (mut session, _) = session_with(still([10, 20, 30, 255]));
        session.new_sequence("test");
        for _ in 0..3 {
            session.capture().unwrap();
        }
        session.scrub_to(0);

        assert!(session.undo());
        assert_eq!(session.frame_count(), 2);
        assert_eq!(session.playback_position().index, 0);
        assert_eq!(session.preview().unwrap().drawn.len(), 2);
    }

    #[test]
    fn test_undo_on_empty_sequence_is_noop() {
        let (mut session, _) = session_with(still([0, 0, 0, 255]));
        assert!(!session.undo());
        session.new_sequence("test");
        assert!(!session.undo());
        assert_eq!(session.capture_stats().frames_undone, 0);
    }

    #[test]
    fn test_clearing_pauses_playback() {
        let (mut session, _) = session_with(still([0, 0, 0, 255]));
        session.new_sequence("test");
        session.capture().unwrap();
        assert!(session.play());

        session.clear_frames().unwrap();
        assert_eq!(session.playback_state(), PlaybackState::Paused);
        assert_eq!(session.playback_position().to_string(), "0 / 0");
    }

    /// A camera that can be switched off mid-session.
    struct SwitchableCamera {
        on: Arc<AtomicBool>,
        image: RgbaImage,
    }

    impl LiveSource for SwitchableCamera {
        fn intrinsic_size(&self) -> (u32, u32) {
            if self.on.load(Ordering::SeqCst) {
                self.image.dimensions()
            } else {
                (0, 0)
            }
        }

        fn snapshot(&self) -> ToymovieResult<RgbaImage> {
            if self.on.load(Ordering::SeqCst) {
                Ok(self.image.clone())
            } else {
                Err(ToymovieError::CaptureNotReady)
            }
        }
    }

    #[test]
    fn test_clear_requests_redraw_for_clear() {
        let on = Arc::new(AtomicBool::new(true));
        let camera = SwitchableCamera {
            on: Arc::clone(&on),
            image: RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])),
        };
        let (mut session, _) = session_with(Box::new(camera));
        session.new_sequence("test");
        session.capture().unwrap();
        assert!(!session.compositor().is_dirty());

        // With the camera off the redraw stays pending and keeps its reason.
        on.store(false, Ordering::SeqCst);
        session.clear_frames().unwrap();
        assert_eq!(
            session.compositor().pending_reason(),
            Some(RedrawReason::Clear)
        );

        on.store(true, Ordering::SeqCst);
        let composite = session.render_preview().unwrap().unwrap();
        assert!(composite.drawn.is_empty());
    }

    #[test]
    fn test_listener_sees_every_change_after_it_happened() {
        let log: Arc<Mutex<Vec<(SequenceChange, usize)>>> = Arc::default();
        let sink = Arc::clone(&log);
        let (session, _) = session_with(still([0, 0, 0, 255]));
        let mut session = session.with_listener(Box::new(move |change, frames| {
            sink.lock().unwrap().push((*change, frames.len()));
        }));

        session.new_sequence("test");
        session.capture().unwrap();
        session.capture().unwrap();
        session.undo();
        session.clear_frames().unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                (SequenceChange::Captured { ordinal: 0 }, 1),
                (SequenceChange::Captured { ordinal: 1 }, 2),
                (SequenceChange::Undone { ordinal: 1 }, 1),
                (SequenceChange::Cleared, 0),
            ]
        );
    }

    #[test]
    fn test_opening_a_sequence_resets_playback() {
        let (mut session, _) = session_with(still([0, 0, 0, 255]));
        session.new_sequence("first");
        for _ in 0..3 {
            session.capture().unwrap();
        }
        session.play();

        let payloads: Vec<FramePayload> = session
            .frames()
            .unwrap()
            .iter()
            .map(|f| f.payload().clone())
            .collect();
        session.open_sequence("second", payloads);
        assert_eq!(session.playback_state(), PlaybackState::Paused);
        assert_eq!(session.playback_position().to_string(), "1 / 3");
        assert_eq!(session.sequence().unwrap().name, "second");
    }

    #[test]
    fn test_overlay_changes_recomposite() {
        let (mut session, _) = session_with(still([0, 0, 0, 255]));
        session.new_sequence("test");
        for _ in 0..4 {
            session.capture().unwrap();
        }
        let renders = session.compositor().render_count();

        assert_eq!(session.set_overlay_count(1), 1);
        assert_eq!(session.preview().unwrap().drawn.len(), 1);
        assert_eq!(session.set_overlay_opacity(2.0), 1.0);
        assert_eq!(session.compositor().render_count(), renders + 2);
    }

    #[test]
    fn test_preview_waits_for_live_source() {
        let source = SharedFrameSource::new();
        let publisher = source.publisher();
        let (mut session, _) = session_with(Box::new(source));
        session.new_sequence("test");
        assert!(session.preview().is_none());
        assert!(session.compositor().is_dirty());

        publisher.publish(RgbaImage::from_pixel(4, 4, Rgba([7, 7, 7, 255])));
        let composite = session.render_preview().unwrap().unwrap();
        assert_eq!(composite.image.get_pixel(0, 0).0, [7, 7, 7, 255]);
    }

    #[test]
    fn test_undecodable_playback_frame_shows_nothing() {
        let (mut session, _) = session_with(still([0, 0, 0, 255]));
        session.open_sequence("broken", [FramePayload::from_bytes(b"nope".to_vec())]);
        assert!(session.player_image().is_none());
        assert_eq!(session.preview().unwrap().skipped, vec![0]);
    }

    #[test]
    fn test_step_paused_pauses_then_steps() {
        let (mut session, _) = session_with(still([0, 0, 0, 255]));
        session.new_sequence("test");
        for _ in 0..3 {
            session.capture().unwrap();
        }
        session.play();
        session.step_paused(1);
        assert_eq!(session.playback_state(), PlaybackState::Paused);
        assert_eq!(session.playback_position().index, 0);
    }

    #[test]
    fn test_ticks_advance_player_image() {
        let (mut session, clock) = session_with(still([0, 0, 0, 255]));
        session.new_sequence("test");
        session.capture().unwrap();
        session.capture().unwrap();
        session.scrub_to(0);
        session.play();

        clock.advance_ms(250);
        assert!(session.tick());
        assert_eq!(session.playback_position().index, 1);
        assert!(session.player_image().is_some());
    }
}
