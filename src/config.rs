// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON under the platform config directory. Missing files and
//! missing fields fall back to defaults; a few environment variables override
//! the backend connection so secrets can stay out of the file.

use crate::backends::camera::{CameraBackendType, FacingMode, StreamConstraints};
use crate::constants;
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::CompressOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable overriding the backend URL
pub const ENV_BACKEND_URL: &str = "BOXTRACK_BACKEND_URL";
/// Environment variable overriding the backend anon key
pub const ENV_ANON_KEY: &str = "BOXTRACK_ANON_KEY";
/// Environment variable overriding the locator base URL
pub const ENV_BASE_URL: &str = "BOXTRACK_BASE_URL";

/// Managed backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: Option<String>,
    /// Public anon key sent as `apikey` and bearer token
    pub anon_key: Option<String>,
    /// Bucket holding item photos
    pub photo_bucket: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            photo_bucket: constants::backend::PHOTO_BUCKET.to_string(),
        }
    }
}

impl BackendSettings {
    /// Both URL and key are present and non-blank
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.url) && present(&self.anon_key)
    }
}

/// Box locator and QR image settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Base URL printed into QR codes; the box id is appended as `?box=<id>`
    pub base_url: String,
    /// On-screen QR size
    pub display_size: u32,
    /// Downloadable QR size
    pub download_size: u32,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173/".to_string(),
            display_size: constants::qr::DISPLAY_SIZE,
            download_size: constants::qr::DOWNLOAD_SIZE,
        }
    }
}

/// Photo compression settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoSettings {
    pub max_dimension: u32,
    /// 0.0 - 1.0
    pub quality: f32,
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self {
            max_dimension: constants::photo::MAX_DIMENSION,
            quality: constants::photo::QUALITY,
        }
    }
}

impl PhotoSettings {
    pub fn compress_options(&self) -> CompressOptions {
        CompressOptions::new(self.max_dimension, self.quality)
    }
}

/// Camera settings used by scan sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub backend: CameraBackendType,
    /// V4L2 device path
    pub device: String,
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            device: constants::camera::DEFAULT_DEVICE.to_string(),
            facing: FacingMode::Environment,
            ideal_width: constants::camera::IDEAL_WIDTH,
            ideal_height: constants::camera::IDEAL_HEIGHT,
        }
    }
}

impl CameraSettings {
    pub fn constraints(&self) -> StreamConstraints {
        StreamConstraints {
            facing: self.facing,
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendSettings,
    pub links: LinkSettings,
    pub photo: PhotoSettings,
    pub camera: CameraSettings,
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("boxtrack").join("config.json"))
    }

    /// Load from the default path and apply environment overrides
    pub fn load() -> AppResult<Self> {
        let mut config = match Self::default_path() {
            Some(path) => Self::load_from(&path)?,
            None => {
                warn!("No config directory on this platform, using defaults");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a file; a missing file yields defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let config = serde_json::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write to a file, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, json)
            .map_err(|e| AppError::Config(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BACKEND_URL) {
            self.backend.url = Some(url);
        }
        if let Some(key) = lookup(ENV_ANON_KEY) {
            self.backend.anon_key = Some(key);
        }
        if let Some(base) = lookup(ENV_BASE_URL) {
            self.links.base_url = base;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"photo": {"max_dimension": 800}}"#).unwrap();
        assert_eq!(config.photo.max_dimension, 800);
        assert!((config.photo.quality - constants::photo::QUALITY).abs() < f32::EPSILON);
        assert_eq!(config.backend.photo_bucket, constants::backend::PHOTO_BUCKET);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            ENV_BACKEND_URL => Some("https://example.supabase.co".to_string()),
            ENV_ANON_KEY => Some("anon".to_string()),
            _ => None,
        });
        assert!(config.backend.is_configured());
        assert_eq!(config.links.base_url, LinkSettings::default().base_url);
    }

    #[test]
    fn test_blank_key_is_not_configured() {
        let settings = BackendSettings {
            url: Some("https://example.supabase.co".to_string()),
            anon_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_facing_mode_serializes_lowercase() {
        let json = serde_json::to_string(&CameraSettings::default()).unwrap();
        assert!(json.contains("\"environment\""));
    }
}
