//! Print the effective configuration.

use toymovie_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let path = config_file_path();
    let origin = if path.exists() { "loaded from" } else { "defaults; not found at" };
    println!("# {origin} {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
