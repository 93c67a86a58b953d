//! Player definition files.
//!
//! Definitions are plain text. A line at column 0 starts a player section and
//! holds its name; indented lines below it are keys ending in `:`, and lines
//! indented one level further are the values of the preceding key:
//!
//! ```text
//! # comment
//! VLC media player
//! 	executables:
//! 		vlc
//! 	strategies:
//! 		open_files
//! 		window_title
//! 	window_title_format:
//! 		%title% - VLC media player
//! ```
//!
//! Single values may also follow the key inline (`type: web_browser`).
//! Indentation uses tabs, or a consistent number of spaces per level taken
//! from the first space-indented line.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::model::{Player, PlayerType, Strategy, StrategyPolicy};
use crate::pattern::Pattern;
use crate::title_format::TitleFormat;

/// Player definitions bundled with the crate. Used when no file is given.
pub const EMBEDDED_DB: &str = include_str!("../data/players.conf");

/// Ordered set of player definitions.
#[derive(Debug, Clone, Default)]
pub struct PlayerDatabase {
    pub players: Vec<Player>,
}

impl PlayerDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
        }
    }

    /// Parse the bundled definitions.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::parse(EMBEDDED_DB)
    }

    /// Read and parse a definition file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self::parse(&text)?;
        debug!(path = %path.display(), players = db.players.len(), "Loaded player definitions");
        Ok(db)
    }

    /// Parse definitions from text. Declaration order is preserved.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Parser::default().run(text).map(|players| Self { players })
    }

    /// Merge a user database into this one.
    /// Players with matching names are replaced; new players are appended.
    pub fn merge_user(&mut self, user_db: &PlayerDatabase) {
        for user_player in &user_db.players {
            if let Some(existing) = self.players.iter_mut().find(|p| p.name == user_player.name) {
                *existing = user_player.clone();
            } else {
                self.players.push(user_player.clone());
            }
        }
    }

    /// Find a player by name (exact match).
    pub fn find(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Executables,
    Windows,
    Strategies,
    Type,
    WindowTitleFormat,
    StrategyPolicy,
}

impl Key {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "executables" => Some(Key::Executables),
            "windows" => Some(Key::Windows),
            "strategies" => Some(Key::Strategies),
            "type" => Some(Key::Type),
            "window_title_format" => Some(Key::WindowTitleFormat),
            "strategy_policy" => Some(Key::StrategyPolicy),
            _ => None,
        }
    }
}

/// A player section being read.
struct Section {
    name: String,
    line: usize,
    executables: Vec<Pattern>,
    windows: Vec<Pattern>,
    strategies: Vec<Strategy>,
    player_type: Option<PlayerType>,
    window_title_format: Option<TitleFormat>,
    strategy_policy: Option<StrategyPolicy>,
}

impl Section {
    fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            line,
            executables: Vec::new(),
            windows: Vec::new(),
            strategies: Vec::new(),
            player_type: None,
            window_title_format: None,
            strategy_policy: None,
        }
    }

    fn add(&mut self, key: Key, value: &str, line: usize) -> Result<(), ConfigError> {
        match key {
            Key::Executables => {
                let p = Pattern::executable(value).map_err(|source| ConfigError::Pattern {
                    line,
                    pattern: value.to_string(),
                    source,
                })?;
                self.executables.push(p);
            }
            Key::Windows => {
                let p = Pattern::window_class(value).map_err(|source| ConfigError::Pattern {
                    line,
                    pattern: value.to_string(),
                    source,
                })?;
                self.windows.push(p);
            }
            Key::Strategies => {
                let strategy = parse_strategy(value).ok_or_else(|| ConfigError::UnknownStrategy {
                    line,
                    token: value.to_string(),
                })?;
                if self.strategies.contains(&strategy) {
                    return Err(syntax(line, format!("strategy {value:?} listed twice")));
                }
                self.strategies.push(strategy);
            }
            Key::Type => {
                let t = parse_player_type(value)
                    .ok_or_else(|| syntax(line, format!("unknown player type {value:?}")))?;
                set_once(&mut self.player_type, t, "type", line)?;
            }
            Key::WindowTitleFormat => {
                let format =
                    TitleFormat::parse(value).map_err(|message| ConfigError::TitleFormat {
                        line,
                        format: value.to_string(),
                        message,
                    })?;
                set_once(&mut self.window_title_format, format, "window_title_format", line)?;
            }
            Key::StrategyPolicy => {
                let policy = parse_policy(value)
                    .ok_or_else(|| syntax(line, format!("unknown strategy policy {value:?}")))?;
                set_once(&mut self.strategy_policy, policy, "strategy_policy", line)?;
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Player, ConfigError> {
        if self.executables.is_empty() {
            return Err(ConfigError::MissingExecutables { player: self.name });
        }
        if self.strategies.is_empty() {
            warn!(player = %self.name, line = self.line, "Player declares no strategies and will never report media");
        }
        Ok(Player {
            name: self.name,
            player_type: self.player_type.unwrap_or_default(),
            strategies: self.strategies,
            executables: self.executables,
            windows: self.windows,
            window_title_format: self.window_title_format,
            strategy_policy: self.strategy_policy.unwrap_or_default(),
        })
    }
}

#[derive(Default)]
struct Parser {
    players: Vec<Player>,
    names: HashSet<String>,
    section: Option<Section>,
    key: Option<Key>,
    /// Width of one indentation level when the file indents with spaces.
    space_unit: Option<usize>,
}

impl Parser {
    fn run(mut self, text: &str) -> Result<Vec<Player>, ConfigError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let raw = raw.trim_end();
            let content = raw.trim_start();
            if content.is_empty() || self.is_comment(raw, content) {
                continue;
            }

            match self.indent_level(raw, line)? {
                0 => self.start_section(content, line)?,
                1 => self.key_line(content, line)?,
                2 => self.value_line(content, line)?,
                level => {
                    return Err(syntax(line, format!("indentation level {level} is too deep")));
                }
            }
        }

        self.close_section()?;
        Ok(self.players)
    }

    /// `#` opens a comment above value depth. Values may start with it, as
    /// the `#32770` dialog class does.
    fn is_comment(&self, raw: &str, content: &str) -> bool {
        if !content.starts_with('#') {
            return false;
        }
        let indent = &raw[..raw.len() - content.len()];
        let depth = if indent.chars().all(|c| c == '\t') {
            indent.len()
        } else if indent.chars().all(|c| c == ' ') {
            self.space_unit.map_or(0, |unit| indent.len() / unit)
        } else {
            0
        };
        depth < 2
    }

    fn indent_level(&mut self, raw: &str, line: usize) -> Result<usize, ConfigError> {
        let indent = &raw[..raw.len() - raw.trim_start_matches([' ', '\t']).len()];
        if indent.is_empty() {
            return Ok(0);
        }
        let tabs = indent.chars().all(|c| c == '\t');
        let spaces = indent.chars().all(|c| c == ' ');
        if tabs {
            return Ok(indent.len());
        }
        if !spaces {
            return Err(syntax(line, "indentation mixes tabs and spaces"));
        }
        let unit = *self.space_unit.get_or_insert(indent.len());
        if indent.len() % unit != 0 {
            return Err(syntax(
                line,
                format!("indentation of {} spaces is not a multiple of {unit}", indent.len()),
            ));
        }
        Ok(indent.len() / unit)
    }

    fn start_section(&mut self, name: &str, line: usize) -> Result<(), ConfigError> {
        self.close_section()?;
        if !self.names.insert(name.to_string()) {
            return Err(ConfigError::DuplicatePlayer {
                line,
                name: name.to_string(),
            });
        }
        self.section = Some(Section::new(name, line));
        Ok(())
    }

    fn close_section(&mut self) -> Result<(), ConfigError> {
        self.key = None;
        if let Some(section) = self.section.take() {
            self.players.push(section.finish()?);
        }
        Ok(())
    }

    fn key_line(&mut self, content: &str, line: usize) -> Result<(), ConfigError> {
        let section = self
            .section
            .as_mut()
            .ok_or_else(|| syntax(line, "key outside of a player section"))?;
        let (token, rest) = content
            .split_once(':')
            .ok_or_else(|| syntax(line, format!("expected `key:`, found {content:?}")))?;
        let token = token.trim();
        let key = Key::parse(token).ok_or_else(|| ConfigError::UnknownKey {
            line,
            key: token.to_string(),
        })?;

        let rest = rest.trim();
        if !rest.is_empty() {
            section.add(key, rest, line)?;
        }
        self.key = Some(key);
        Ok(())
    }

    fn value_line(&mut self, content: &str, line: usize) -> Result<(), ConfigError> {
        let (Some(section), Some(key)) = (self.section.as_mut(), self.key) else {
            return Err(syntax(line, "value without a key"));
        };
        section.add(key, content, line)
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, key: &str, line: usize) -> Result<(), ConfigError> {
    if slot.is_some() {
        return Err(syntax(line, format!("`{key}` takes a single value")));
    }
    *slot = Some(value);
    Ok(())
}

fn syntax(line: usize, message: impl Into<String>) -> ConfigError {
    ConfigError::Syntax {
        line,
        message: message.into(),
    }
}

/// Lowercase a token and drop `_`/`-` so `open_files` and `OpenFiles` agree.
fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_strategy(token: &str) -> Option<Strategy> {
    match normalize_token(token).as_str() {
        "windowtitle" => Some(Strategy::WindowTitle),
        "openfiles" => Some(Strategy::OpenFiles),
        "uiautomation" => Some(Strategy::UiAutomation),
        _ => None,
    }
}

fn parse_player_type(token: &str) -> Option<PlayerType> {
    match normalize_token(token).as_str() {
        "default" => Some(PlayerType::Default),
        "webbrowser" | "browser" => Some(PlayerType::WebBrowser),
        _ => None,
    }
}

fn parse_policy(token: &str) -> Option<StrategyPolicy> {
    match normalize_token(token).as_str() {
        "accumulate" => Some(StrategyPolicy::Accumulate),
        "firstmatch" => Some(StrategyPolicy::FirstMatch),
        _ => None,
    }
}
