//! Data model shared by every stage of a detection call.
//!
//! All types serialize with camelCase field names so a host binding can pass
//! them through to JSON unchanged.

use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;
use crate::title_format::TitleFormat;

/// Whether a player is a regular media player or a web browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerType {
    #[default]
    Default,
    WebBrowser,
}

/// A named extraction technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    WindowTitle,
    OpenFiles,
    UiAutomation,
}

impl Strategy {
    /// Position of this strategy in handler tables.
    pub(crate) fn index(self) -> usize {
        match self {
            Strategy::WindowTitle => 0,
            Strategy::OpenFiles => 1,
            Strategy::UiAutomation => 2,
        }
    }
}

/// How the results of several strategies are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyPolicy {
    /// Run every strategy and keep everything they report.
    #[default]
    Accumulate,
    /// Stop after the first strategy that reported anything.
    FirstMatch,
}

/// A player or browser definition from the configuration file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    #[serde(rename = "type")]
    pub player_type: PlayerType,
    /// Tried in declared order.
    pub strategies: Vec<Strategy>,
    /// Process-name patterns (case-insensitive globs).
    pub executables: Vec<Pattern>,
    /// Window-class patterns (case-sensitive globs). Empty matches any window.
    pub windows: Vec<Pattern>,
    pub window_title_format: Option<TitleFormat>,
    pub strategy_policy: StrategyPolicy,
}

impl Player {
    pub fn is_browser(&self) -> bool {
        self.player_type == PlayerType::WebBrowser
    }
}

/// A running OS process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub id: u32,
    pub name: String,
}

/// A top-level visible window. The handle is only meaningful during the
/// detection call that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub handle: u64,
    pub class_name: String,
    pub text: String,
}

/// Kind of a piece of extracted metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaInfoType {
    File,
    Tab,
    Title,
    Url,
    Unknown,
}

/// One typed piece of extracted metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(rename = "type")]
    pub info_type: MediaInfoType,
    pub value: String,
}

impl MediaInfo {
    pub fn new(info_type: MediaInfoType, value: impl Into<String>) -> Self {
        Self {
            info_type,
            value: value.into(),
        }
    }
}

/// Playback state. No strategy determines it yet, so it is always `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaState {
    Playing,
    Paused,
    Stopped,
    #[default]
    Unknown,
}

/// Media found in one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub state: MediaState,
    /// Milliseconds. Always 0 for now.
    pub duration: u64,
    /// Milliseconds. Always 0 for now.
    pub position: u64,
    pub information: Vec<MediaInfo>,
}

impl Media {
    pub fn is_empty(&self) -> bool {
        self.information.is_empty()
    }
}

/// A matched player, the process and window it was found in, and what it is
/// playing.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    pub player: Player,
    pub process: Process,
    pub window: Window,
    pub media: Vec<Media>,
}

/// Names of all configured players, split by type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerList {
    pub players: Vec<String>,
    pub browsers: Vec<String>,
}
