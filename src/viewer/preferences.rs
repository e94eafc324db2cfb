//! The two product-page choices remembered between visits.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::util::Result;

use super::colorize::Variant;

pub const VARIANT_KEY: &str = "runvault-variant";
pub const SIZE_KEY: &str = "runvault-size";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Stored {
    #[serde(rename = "runvault-variant", default, skip_serializing_if = "Option::is_none")]
    variant: Option<String>,
    #[serde(rename = "runvault-size", default, skip_serializing_if = "Option::is_none")]
    size: Option<String>,
}

/// Variant and size selections backed by a small JSON file.
///
/// Read once when opened, written through on every change. Absent keys
/// mean first visit: the variant defaults to [`Variant::Skywave`] and no
/// size is selected.
#[derive(Debug)]
pub struct Preferences {
    path: PathBuf,
    stored: Stored,
}

impl Preferences {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stored = match std::fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring malformed preferences");
                Stored::default()
            }),
            Err(_) => Stored::default(),
        };
        Self { path, stored }
    }

    /// Preferences file next to the settings file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("runvault-viewer").join("preferences.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored variant if it names a known colorway, else the default.
    pub fn variant(&self) -> Variant {
        self.stored
            .variant
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    pub fn size(&self) -> Option<&str> {
        self.stored.size.as_deref()
    }

    pub fn set_variant(&mut self, variant: Variant) -> Result<()> {
        self.stored.variant = Some(variant.id().to_string());
        self.write()
    }

    /// Empty sizes are not stored.
    pub fn set_size(&mut self, size: &str) -> Result<()> {
        if size.is_empty() {
            return Ok(());
        }
        self.stored.size = Some(size.to_string());
        self.write()
    }

    fn write(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, serde_json::to_string(&self.stored)?)?;
        Ok(())
    }
}
