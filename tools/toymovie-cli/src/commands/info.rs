//! Show sequence information.

use std::path::PathBuf;

use toymovie_common::config::AppConfig;
use toymovie_frame_store::{FrameStore, FrameSummary};

use super::load_sequence;

pub fn run(config: &AppConfig, frames: PathBuf, json: bool) -> anyhow::Result<()> {
    let sequence = load_sequence(&frames)?;
    let store = FrameStore::from_payloads(sequence.payloads);
    let summaries: Vec<FrameSummary> = store.iter().map(|f| f.summary()).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let fps = config.playback.fps;
    println!("Sequence: {}", sequence.name);
    println!("  Frames: {}", store.len());
    println!(
        "  Duration: {:.2}s @ {}fps",
        store.len() as f64 / fps,
        fps
    );
    let total_bytes: usize = summaries.iter().map(|s| s.bytes).sum();
    println!("  Payload: {total_bytes} bytes");
    println!();

    if summaries.is_empty() {
        println!("No frames.");
        return Ok(());
    }

    println!("Frames:");
    for (summary, path) in summaries.iter().zip(&sequence.files) {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if summary.width == 0 {
            println!(
                "  {:>4} / {}  {}  (unreadable, {} bytes)",
                summary.ordinal + 1,
                store.len(),
                file,
                summary.bytes
            );
        } else {
            println!(
                "  {:>4} / {}  {}  {}x{}  {} bytes",
                summary.ordinal + 1,
                store.len(),
                file,
                summary.width,
                summary.height,
                summary.bytes
            );
        }
    }

    Ok(())
}
