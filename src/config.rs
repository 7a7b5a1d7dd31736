//! Checker configuration.
//!
//! Read from an explicit file or from `.ifccheck.json` in the working
//! directory. Every field has a default, so a missing file or a partial one
//! is fine.

use crate::error::ConfigError;
use crate::export::ExportMode;
use crate::validation::DEFAULT_PROGRESS_INTERVAL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".ifccheck.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckerConfig {
    /// Elements between two progress reports.
    pub progress_interval: usize,

    pub export_mode: ExportMode,

    /// Rule pack used when `validate` gets neither `--rules` nor `--ids`.
    pub default_rule_pack: Option<PathBuf>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            export_mode: ExportMode::Auto,
            default_rule_pack: None,
        }
    }
}

impl CheckerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Loads `.ifccheck.json` from `dir`, or the defaults if there is none.
    pub fn discover_in(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// An explicit path must exist; otherwise the working directory is searched.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => Self::discover_in(Path::new(".")),
        }
    }
}
