//! Async driver that sleeps until each playback deadline and ticks the
//! controller.
//!
//! Runs on the caller's task; nothing is spawned, so the controller and
//! the store are only ever touched from one place.

use std::ops::ControlFlow;

use toymovie_frame_store::FrameStore;

use crate::controller::{PlaybackController, PlaybackPosition};

/// Drive playback until the controller stops playing or `on_advance`
/// breaks. The controller is paused on return. Returns the number of
/// frames advanced.
pub async fn run_playback<F>(
    controller: &mut PlaybackController,
    store: &FrameStore,
    mut on_advance: F,
) -> usize
where
    F: FnMut(PlaybackPosition) -> ControlFlow<()>,
{
    let mut advanced = 0usize;
    while let Some(wait) = controller.time_until_next_tick() {
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        if !controller.tick(store) {
            continue;
        }
        advanced += 1;
        if on_advance(controller.position(store)).is_break() {
            break;
        }
    }
    controller.pause();
    tracing::debug!(advanced, "Playback driver finished");
    advanced
}
