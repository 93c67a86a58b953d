//! Host-facing entry points.
//!
//! [`get_media_results`] and [`get_player_list`] load player definitions from
//! a file (or the bundled set when no path is given) and run one detection
//! call on the current OS. [`Engine`] exposes the same calls with the player
//! source, options and backend chosen by the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

pub use kansoku_detect::{
    DetectError, DetectOptions, DetectionResult, MediaInfo, Platform, PlayerDatabase, PlayerList,
};
use kansoku_detect::strategy::MediaFilter;
use kansoku_detect::{list_names, Detector};

/// Detect media with the definitions at `config_path`, or the bundled ones
/// when `None`.
pub fn get_media_results(config_path: Option<&Path>) -> Result<Vec<DetectionResult>, DetectError> {
    Engine::from_path(config_path).media_results()
}

/// Names of the configured players and browsers.
pub fn get_player_list(config_path: Option<&Path>) -> Result<PlayerList, DetectError> {
    Engine::from_path(config_path).player_list()
}

/// [`get_media_results`] on tokio's blocking pool.
pub async fn get_media_results_async(
    config_path: Option<PathBuf>,
) -> Result<Vec<DetectionResult>, DetectError> {
    Engine::from_path(config_path.as_deref())
        .media_results_async()
        .await
}

/// A configured detection engine.
///
/// Player definitions are read on every call, so edits to the file are
/// picked up without rebuilding the engine.
#[derive(Clone, Default)]
pub struct Engine {
    config_path: Option<PathBuf>,
    overrides: Vec<PathBuf>,
    options: DetectOptions,
    platform: Option<Arc<dyn Platform>>,
    filter: Option<Arc<MediaFilter>>,
}

impl Engine {
    /// Engine using the bundled definitions and the OS backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine reading definitions from `path`.
    pub fn with_config(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(path.into()),
            ..Self::default()
        }
    }

    fn from_path(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::with_config(path),
            None => Self::new(),
        }
    }

    /// Overlay the definitions in `path` on the base set. Players with the
    /// same name are replaced, others appended.
    pub fn with_overrides(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides.push(path.into());
        self
    }

    pub fn with_options(mut self, options: DetectOptions) -> Self {
        self.options = options;
        self
    }

    /// Use `platform` instead of the backend for the running OS.
    pub fn with_platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Only report media information accepted by `filter`.
    pub fn with_media_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&MediaInfo) -> bool + Send + Sync + 'static,
    {
        let filter: Arc<MediaFilter> = Arc::new(filter);
        self.filter = Some(filter);
        self
    }

    /// Load the player definitions this engine detects.
    pub fn players(&self) -> Result<PlayerDatabase, DetectError> {
        let mut db = match &self.config_path {
            Some(path) => PlayerDatabase::load(path)?,
            None => PlayerDatabase::embedded()?,
        };
        for path in &self.overrides {
            let user = PlayerDatabase::load(path)?;
            debug!(path = %path.display(), players = user.len(), "Merging player overrides");
            db.merge_user(&user);
        }
        Ok(db)
    }

    pub fn player_list(&self) -> Result<PlayerList, DetectError> {
        Ok(list_names(&self.players()?.players))
    }

    /// Run one detection call on the current thread.
    pub fn media_results(&self) -> Result<Vec<DetectionResult>, DetectError> {
        // Definitions first: a broken file is reported even where no backend
        // exists.
        let db = self.players()?;
        let detector = self.detector()?;
        Ok(detector.detect(&db.players))
    }

    /// Run one detection call on tokio's blocking pool.
    pub async fn media_results_async(&self) -> Result<Vec<DetectionResult>, DetectError> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.media_results())
            .await
            .map_err(|e| DetectError::EngineUnavailable(format!("detection task failed: {e}")))?
    }

    fn detector(&self) -> Result<Detector, DetectError> {
        let detector = match &self.platform {
            Some(platform) => Detector::new(platform.clone()),
            None => Detector::system()?,
        };
        let detector = detector.with_options(self.options.clone());
        Ok(match &self.filter {
            Some(filter) => {
                let filter = filter.clone();
                detector.with_media_filter(move |info| filter(info))
            }
            None => detector,
        })
    }
}
