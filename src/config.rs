// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON at `<config dir>/shutter/config.json`. Every field has a
//! default so older or partial files keep loading.

use crate::backends::camera::{DevicePosition, FlashMode, PhotoCodec, SessionPreset};
use crate::constants::{APP_DIR_NAME, DEFAULT_SAVE_FOLDER, JpegQuality};
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder under the pictures directory that receives photos
    pub save_folder: String,
    /// Absolute photo directory, overrides `save_folder` when set
    pub photo_directory: Option<PathBuf>,
    /// Capture quality preset applied at session setup
    pub session_preset: SessionPreset,
    /// Flash mode used for every capture
    pub flash_mode: FlashMode,
    /// Still image stabilization
    pub stabilization: bool,
    /// Output codec
    pub codec: PhotoCodec,
    /// JPEG quality preset
    pub jpeg_quality: JpegQuality,
    /// Select front / unspecified cameras when no back camera exists
    pub fallback_to_any_camera: bool,
    /// Camera position to start on instead of the back camera
    ///
    /// Only set by the user or `--front`; switching cameras never writes it.
    pub preferred_position: Option<DevicePosition>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_folder: DEFAULT_SAVE_FOLDER.to_string(),
            photo_directory: None,
            session_preset: SessionPreset::Photo,
            flash_mode: FlashMode::Auto,
            stabilization: true,
            codec: PhotoCodec::Jpeg,
            jpeg_quality: JpegQuality::default(),
            fallback_to_any_camera: true,
            preferred_position: None,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => {
                warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`; a missing or malformed file yields defaults
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Load from `path`, reporting errors
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Directory photos are written to
    pub fn photo_dir(&self) -> PathBuf {
        self.photo_directory
            .clone()
            .unwrap_or_else(|| crate::storage::get_default_photo_dir(&self.save_folder))
    }
}
