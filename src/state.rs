//! Persisted form state: the last prompt, options and result.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::config_dir;
use crate::error::BananaError;
use crate::params::{AspectRatio, Resolution};
use crate::workflow::GenerationResult;

/// Snapshot of what the user last entered and got back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormState {
    /// Last prompt.
    pub prompt: String,
    /// Last negative prompt.
    pub negative_prompt: String,
    /// Last aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Last resolution.
    pub resolution: Resolution,
    /// Last generation outcome, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
}

impl FormState {
    /// URL of the last successful generation.
    #[must_use]
    pub fn last_image_url(&self) -> Option<&str> {
        self.result.as_ref().filter(|r| r.success).and_then(|r| r.image_url.as_deref())
    }

    /// Read a snapshot. A missing or unreadable file yields the empty one.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no saved state");
                return Self::default();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring unreadable state file");
            Self::default()
        })
    }

    /// Overwrite the snapshot on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), BananaError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| BananaError::Config(format!("Failed to encode state: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// State file location: `BANANA_STATE`, else `~/.config/banana/state.json`.
#[must_use]
pub fn state_path() -> PathBuf {
    match std::env::var("BANANA_STATE") {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => config_dir().join("state.json"),
    }
}
