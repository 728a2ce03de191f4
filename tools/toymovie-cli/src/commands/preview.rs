//! Write an onion-skin preview image.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use toymovie_capture_engine::{LiveSource, StillImageSource, StopMotionSession};
use toymovie_common::clock::MonotonicClock;
use toymovie_common::config::AppConfig;
use toymovie_onion_skin::DisplaySize;

use super::load_sequence;

pub struct PreviewArgs {
    pub frames: PathBuf,
    pub live: PathBuf,
    pub count: Option<u32>,
    pub opacity: Option<f32>,
    pub size: Option<(u32, u32)>,
    pub capture: bool,
    pub output: PathBuf,
}

pub fn run(config: &AppConfig, args: PreviewArgs) -> anyhow::Result<()> {
    let sequence = load_sequence(&args.frames)?;
    let source = StillImageSource::open(&args.live)?;
    let (live_width, live_height) = source.intrinsic_size();
    let (width, height) = args.size.unwrap_or((live_width, live_height));

    let mut session =
        StopMotionSession::new(Box::new(source), config, Arc::new(MonotonicClock::start()))?;
    session.resize_display(DisplaySize::new(width, height));
    session.open_sequence(sequence.name.clone(), sequence.payloads);

    if let Some(count) = args.count {
        session.set_overlay_count(count);
    }
    if let Some(opacity) = args.opacity {
        session.set_overlay_opacity(opacity);
    }
    if args.capture {
        let len = session.capture()?;
        println!("Captured frame {len} into {}", sequence.name);
    }

    let overlay = *session.overlay();
    let composite = session
        .render_preview()?
        .context("Live image is empty, nothing to composite")?;
    composite
        .image
        .save(&args.output)
        .with_context(|| format!("Failed to write {:?}", args.output))?;

    println!("Preview written to {}", args.output.display());
    println!("  Size: {}x{}", composite.image.width(), composite.image.height());
    println!(
        "  Overlay: {} frame(s) at opacity {:.2}",
        overlay.count(),
        overlay.opacity()
    );
    for layer in &composite.drawn {
        println!(
            "  Ghost #{:<4} blend {:.3}",
            layer.ordinal + 1,
            layer.blend
        );
    }
    if !composite.skipped.is_empty() {
        let skipped: Vec<String> = composite
            .skipped
            .iter()
            .map(|ordinal| (ordinal + 1).to_string())
            .collect();
        println!("  Skipped (undecodable): {}", skipped.join(", "));
    }

    Ok(())
}
