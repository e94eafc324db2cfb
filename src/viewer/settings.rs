//! Persistent viewer settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::asset::{FsSource, DEFAULT_ASSET_URL};
use crate::util::Result;

use super::cinematic::DEFAULT_SMOOTHING;
use super::instance::DEFAULT_MAX_PIXEL_RATIO;

/// Settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Assets
    pub asset_root: PathBuf,
    pub default_asset_url: String,

    // Motion
    pub reduced_motion: bool,
    pub smoothing: f32, // per-frame pull at 60 fps, 0..=1

    // Rendering
    pub max_pixel_ratio: f32, // 1..=3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("public"),
            default_asset_url: DEFAULT_ASSET_URL.to_string(),
            reduced_motion: false,
            smoothing: DEFAULT_SMOOTHING,
            max_pixel_ratio: DEFAULT_MAX_PIXEL_RATIO,
        }
    }
}

impl Settings {
    /// Get settings file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("runvault-viewer");
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the default location. Missing or unreadable files
    /// give defaults.
    pub fn load() -> Self {
        Self::path().map(|p| Self::load_from(&p)).unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        let settings: Self = match std::fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring malformed settings");
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        settings.sanitized()
    }

    /// Asset source rooted at `asset_root`; asset URLs resolve below it.
    pub fn asset_source(&self) -> FsSource {
        FsSource::new(&self.asset_root)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        match Self::path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Pull out-of-range values back to something usable.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.smoothing = if self.smoothing.is_finite() {
            self.smoothing.clamp(0.01, 1.0)
        } else {
            defaults.smoothing
        };
        self.max_pixel_ratio = if self.max_pixel_ratio.is_finite() {
            self.max_pixel_ratio.clamp(1.0, 3.0)
        } else {
            defaults.max_pixel_ratio
        };
        if self.default_asset_url.trim().is_empty() {
            self.default_asset_url = defaults.default_asset_url;
        }
        self
    }
}
