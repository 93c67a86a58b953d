//! Configuration-driven detection of running media players and browsers.
//!
//! A detection call snapshots the running processes and their windows,
//! matches them against player definitions, and runs each player's
//! extraction strategies to find out what it is playing.

pub mod aggregate;
pub mod engine;
pub mod enumerate;
pub mod error;
pub mod matcher;
pub mod model;
pub mod options;
pub mod pattern;
pub mod platform;
pub mod player_db;
pub mod strategy;
pub mod title_format;

pub use aggregate::list_names;
pub use engine::Detector;
pub use error::{ConfigError, DetectError, EnumerationSkip, StrategyMiss};
pub use model::{
    DetectionResult, Media, MediaInfo, MediaInfoType, MediaState, Player, PlayerList, PlayerType,
    Process, Strategy, StrategyPolicy, Window,
};
pub use options::DetectOptions;
pub use platform::{Platform, ProcessEntry, StaticPlatform};
pub use player_db::PlayerDatabase;
