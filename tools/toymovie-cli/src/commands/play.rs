//! Play a sequence in real time.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use toymovie_capture_engine::{SharedFrameSource, StopMotionSession};
use toymovie_common::clock::MonotonicClock;
use toymovie_common::config::AppConfig;

use super::load_sequence;

pub async fn run(
    config: &AppConfig,
    frames: PathBuf,
    fps: Option<f64>,
    loops: u32,
) -> anyhow::Result<()> {
    let sequence = load_sequence(&frames)?;
    if sequence.payloads.is_empty() {
        anyhow::bail!("No frames found in {frames:?}");
    }
    let len = sequence.payloads.len();

    // Playback only; there is no camera.
    let mut session = StopMotionSession::new(
        Box::new(SharedFrameSource::new()),
        config,
        Arc::new(MonotonicClock::start()),
    )?;
    session.open_sequence(sequence.name.clone(), sequence.payloads);
    if let Some(fps) = fps {
        session.set_frame_rate(fps)?;
    }

    let loops = loops.max(1);
    let remaining = advances_needed(len, loops);
    let frames_per_second = session.playback().frames_per_second();
    println!(
        "Playing {} ({} frames) at {} fps, {} loop(s)",
        sequence.name, len, frames_per_second, loops
    );
    tracing::info!(position = %session.playback_position(), "Frame");

    let mut shown = 1usize;
    if remaining > 0 {
        let mut advanced = 0usize;
        session
            .run_playback(|position| {
                tracing::info!(%position, "Frame");
                advanced += 1;
                if advanced >= remaining {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await;
        shown += advanced;
    }

    println!("Played {shown} frame(s)");
    Ok(())
}

/// Advances after the first frame needed to show `len` frames `loops` times.
fn advances_needed(len: usize, loops: u32) -> usize {
    len.saturating_mul(loops.max(1) as usize).saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame_single_loop_needs_no_advance() {
        assert_eq!(advances_needed(1, 1), 0);
    }

    #[test]
    fn test_advances_cover_every_loop() {
        assert_eq!(advances_needed(3, 1), 2);
        assert_eq!(advances_needed(3, 2), 5);
    }

    #[test]
    fn test_zero_loops_plays_once() {
        assert_eq!(advances_needed(4, 0), 3);
    }
}
