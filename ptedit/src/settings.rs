//! Editor settings.
//!
//! Settings live in `.ptedit.toml` next to the config being edited, or in
//! the file given with `--settings`. Every field is optional.
//!
//! ```toml
//! extensions = ["kinds/emissions.toml"]
//! reduced = true
//! show_comments = false
//! backup = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Default settings file name.
pub const SETTINGS_FILE: &str = ".ptedit.toml";

/// Settings of the config editor.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    /// Extension kind descriptor files (`.toml` or `.json`), relative to the
    /// settings file.
    pub extensions: Vec<PathBuf>,
    /// Show only what differs from the defaults unless told otherwise.
    pub reduced: bool,
    /// Print parameter comments.
    pub show_comments: bool,
    /// Copy the config file to `<stem>.bk-<unix-secs>.<ext>` before
    /// overwriting it.
    pub backup: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            reduced: false,
            show_comments: true,
            backup: true,
        }
    }
}

impl EditorSettings {
    /// Load settings from `path`, falling back to defaults if it does not
    /// exist.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut settings: Self =
            toml::from_str(&text).with_context(|| format!("invalid settings {}", path.display()))?;

        if let Some(dir) = path.parent() {
            for ext in settings.extensions.iter_mut() {
                if ext.is_relative() {
                    *ext = dir.join(&*ext);
                }
            }
        }
        Ok(settings)
    }

    /// JSON Schema of the settings file.
    pub fn schema_json() -> anyhow::Result<String> {
        let schema = schemars::schema_for!(EditorSettings);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}
