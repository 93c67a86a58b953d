use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a detection call.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("detection engine unavailable: {0}")]
    EngineUnavailable(String),
}

/// The player definitions or engine options could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration path is empty")]
    EmptyPath,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: unknown strategy {token:?}")]
    UnknownStrategy { line: usize, token: String },

    #[error("line {line}: unknown key {key:?}")]
    UnknownKey { line: usize, key: String },

    #[error("line {line}: duplicate player {name:?}")]
    DuplicatePlayer { line: usize, name: String },

    #[error("player {player:?} declares no executables")]
    MissingExecutables { player: String },

    #[error("line {line}: invalid pattern {pattern:?}: {source}")]
    Pattern {
        line: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("line {line}: invalid window title format {format:?}: {message}")]
    TitleFormat {
        line: usize,
        format: String,
        message: String,
    },

    #[error("invalid engine options: {0}")]
    Options(#[from] toml::de::Error),
}

/// A process that could not be read during enumeration. Never surfaced to
/// callers; the process is left out of the snapshot.
#[derive(Debug, Error)]
#[error("skipped process {pid}: {reason}")]
pub struct EnumerationSkip {
    pub pid: u32,
    pub reason: String,
}

impl EnumerationSkip {
    pub fn new(pid: u32, reason: impl Into<String>) -> Self {
        Self {
            pid,
            reason: reason.into(),
        }
    }
}

/// A strategy that found nothing. Not an error from the caller's point of
/// view; the strategy contributes no media information.
#[derive(Debug, Error)]
pub enum StrategyMiss {
    #[error("nothing found")]
    NotFound,

    #[error("access denied")]
    AccessDenied,

    #[error("not supported on this platform")]
    Unsupported,

    #[error("query failed: {0}")]
    Query(String),
}
