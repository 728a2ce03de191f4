//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ToymovieError, ToymovieResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Onion-skin overlay defaults.
    #[serde(default)]
    pub overlay: OverlayDefaults,

    /// Playback defaults.
    #[serde(default)]
    pub playback: PlaybackDefaults,

    /// Capture settings.
    #[serde(default)]
    pub capture: CaptureDefaults,

    /// Live preview surface settings.
    #[serde(default)]
    pub preview: PreviewDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default onion-skin parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayDefaults {
    /// Number of most recent frames ghosted over the live view.
    pub count: u32,

    /// Opacity of the newest ghost frame, in `[0.0, 1.0]`.
    pub opacity: f32,

    /// Optional upper bound for the overlay count. `None` means the count
    /// is only limited by the sequence length.
    #[serde(default)]
    pub max_count: Option<u32>,
}

/// Default playback parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackDefaults {
    /// Frames per second.
    pub fps: f64,
}

/// Capture parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureDefaults {
    /// How captured frames are stored.
    #[serde(default)]
    pub encoding: FrameEncoding,
}

/// Storage encoding for captured frame payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum FrameEncoding {
    /// Lossy JPEG with the given quality (1-100).
    Jpeg { quality: u8 },
    /// Lossless PNG.
    Png,
}

/// Live preview surface parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewDefaults {
    /// Width used when the display area reports zero width.
    pub fallback_width: u32,

    /// Height used when the display area reports zero height.
    pub fallback_height: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "toymovie=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for OverlayDefaults {
    fn default() -> Self {
        Self {
            count: 3,
            opacity: 0.5,
            max_count: None,
        }
    }
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self { fps: 4.0 }
    }
}

impl Default for FrameEncoding {
    fn default() -> Self {
        FrameEncoding::Jpeg { quality: 90 }
    }
}

impl Default for PreviewDefaults {
    fn default() -> Self {
        Self {
            fallback_width: 300,
            fallback_height: 400,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &Path) -> ToymovieResult<Self> {
        if !path.exists() {
            return Err(ToymovieError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Reject values the core would refuse at runtime.
    pub fn validate(&self) -> ToymovieResult<()> {
        if !(self.playback.fps.is_finite() && self.playback.fps > 0.0) {
            return Err(ToymovieError::config(format!(
                "playback.fps must be positive, got {}",
                self.playback.fps
            )));
        }
        if !(0.0..=1.0).contains(&self.overlay.opacity) {
            return Err(ToymovieError::config(format!(
                "overlay.opacity must be within [0, 1], got {}",
                self.overlay.opacity
            )));
        }
        if self.preview.fallback_width == 0 || self.preview.fallback_height == 0 {
            return Err(ToymovieError::config(format!(
                "preview fallback size must be non-zero, got {}x{}",
                self.preview.fallback_width, self.preview.fallback_height
            )));
        }
        if let FrameEncoding::Jpeg { quality } = self.capture.encoding {
            if !(1..=100).contains(&quality) {
                return Err(ToymovieError::config(format!(
                    "capture.encoding.quality must be within 1..=100, got {quality}"
                )));
            }
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("toymovie").join("config.json")
}
