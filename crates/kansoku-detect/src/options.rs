use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_OPTIONS: &str = include_str!("../../../config/default.toml");

/// Engine tuning, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectOptions {
    pub engine: EngineOptions,
    pub open_files: OpenFilesOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Upper bound on extraction worker threads.
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenFilesOptions {
    /// Lowercase extensions without the leading dot.
    pub media_extensions: Vec<String>,
    /// Path prefixes that are never reported, compared case-insensitively.
    pub ignored_prefixes: Vec<String>,
}

impl DetectOptions {
    /// Parse options from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Read options from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Worker count actually used for `pairs` pieces of work.
    pub fn worker_count(&self, pairs: usize) -> usize {
        self.engine.workers.max(1).min(pairs.max(1))
    }
}

impl OpenFilesOptions {
    /// Whether `path` looks like a media file worth reporting.
    pub fn is_media_path(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_lowercase();
        if !self.media_extensions.iter().any(|e| *e == ext) {
            return false;
        }
        let lower = path.to_string_lossy().to_lowercase();
        !self
            .ignored_prefixes
            .iter()
            .any(|prefix| lower.starts_with(&prefix.to_lowercase()))
    }
}

impl Default for DetectOptions {
    fn default() -> Self {
        toml::from_str(DEFAULT_OPTIONS).expect("built-in default options are valid TOML")
    }
}
