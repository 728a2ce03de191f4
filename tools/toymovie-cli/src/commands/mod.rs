pub mod config;
pub mod info;
pub mod play;
pub mod preview;

use std::path::{Path, PathBuf};

use anyhow::Context;

use toymovie_frame_store::FramePayload;

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// A sequence read from a directory of image files.
pub struct LoadedSequence {
    pub name: String,
    pub files: Vec<PathBuf>,
    pub payloads: Vec<FramePayload>,
}

/// Read every frame image in `dir`, ordered by file name.
///
/// Files are kept in their encoded form; decoding happens on demand.
pub fn load_sequence(dir: &Path) -> anyhow::Result<LoadedSequence> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Cannot read {dir:?}"))? {
        let path = entry?.path();
        if path.is_file() && is_frame_file(&path) {
            files.push(path);
        }
    }
    files.sort();

    let payloads = files
        .iter()
        .map(|path| {
            std::fs::read(path)
                .map(FramePayload::from_bytes)
                .with_context(|| format!("Cannot read frame {path:?}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sequence".to_string());

    tracing::debug!(name = %name, frames = payloads.len(), "Loaded sequence from disk");
    Ok(LoadedSequence {
        name,
        files,
        payloads,
    })
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
