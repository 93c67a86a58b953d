//! Window title formats.
//!
//! A format is either a template such as `%title% - %artist%`, where literal
//! text separates named slots, or a regular expression whose first capture
//! group is the media title.
//!
//! Every template slot is greedy. When a separator appears more than once the
//! split happens at its rightmost usable occurrence, so `"A - B - C"` against
//! `%title% - %artist%` captures title `"A - B"` and artist `"C"`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::model::{MediaInfo, MediaInfoType};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%([A-Za-z_][A-Za-z0-9_]*)%").expect("valid placeholder regex"));

#[derive(Debug, Clone)]
enum Part {
    Literal(String),
    Slot(String),
}

/// A value captured by one template slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub slot: String,
    pub value: String,
}

/// A `%slot%` template compiled to an anchored expression.
#[derive(Debug, Clone)]
pub struct TitleTemplate {
    source: String,
    parts: Vec<Part>,
    regex: Regex,
}

impl TitleTemplate {
    fn parse(source: &str) -> Result<Self, String> {
        let mut parts = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                parts.push(Part::Literal(source[last..whole.start()].to_string()));
            }
            if matches!(parts.last(), Some(Part::Slot(_))) {
                return Err(format!(
                    "placeholder %{}% directly follows another placeholder",
                    name.as_str()
                ));
            }
            parts.push(Part::Slot(name.as_str().to_string()));
            last = whole.end();
        }
        if last < source.len() {
            parts.push(Part::Literal(source[last..].to_string()));
        }

        let mut pattern = String::from("(?s)^");
        for part in &parts {
            match part {
                Part::Literal(text) => pattern.push_str(&regex::escape(text)),
                Part::Slot(_) => pattern.push_str("(.*)"),
            }
        }
        pattern.push('$');
        let regex = Regex::new(&pattern).map_err(|e| e.to_string())?;

        Ok(Self {
            source: source.to_string(),
            parts,
            regex,
        })
    }

    /// Slot values in template order, or `None` if the text does not have the
    /// template's shape.
    pub fn capture(&self, text: &str) -> Option<Vec<Capture>> {
        let caps = self.regex.captures(text)?;
        let slots = self.parts.iter().filter_map(|p| match p {
            Part::Slot(name) => Some(name),
            Part::Literal(_) => None,
        });
        Some(
            slots
                .enumerate()
                .map(|(i, slot)| Capture {
                    slot: slot.clone(),
                    value: caps
                        .get(i + 1)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default(),
                })
                .collect(),
        )
    }

    /// Rebuild a title from captured values, in template order.
    pub fn render(&self, captures: &[Capture]) -> String {
        let mut values = captures.iter();
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Slot(_) => {
                    if let Some(c) = values.next() {
                        out.push_str(&c.value);
                    }
                }
            }
        }
        out
    }
}

/// How to pull media information out of a window title.
#[derive(Debug, Clone)]
pub enum TitleFormat {
    Template(TitleTemplate),
    Regex { source: String, regex: Regex },
}

impl TitleFormat {
    /// Parse a format. Text containing `%slot%` placeholders is a template,
    /// anything else a regular expression with at least one capture group.
    pub fn parse(source: &str) -> Result<Self, String> {
        if PLACEHOLDER.is_match(source) {
            return TitleTemplate::parse(source).map(TitleFormat::Template);
        }
        let regex = Regex::new(source).map_err(|e| e.to_string())?;
        if regex.captures_len() < 2 {
            return Err("regular expression has no capture group".into());
        }
        Ok(TitleFormat::Regex {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            TitleFormat::Template(t) => &t.source,
            TitleFormat::Regex { source, .. } => source,
        }
    }

    /// Media information found in `text`. Empty if the text does not match.
    ///
    /// Template slots named `title`, `tab`, `url` or `file` become media
    /// information of that type; other slots are ignored. A regular
    /// expression reports its first capture group as `group_type`.
    pub fn extract(&self, text: &str, group_type: MediaInfoType) -> Vec<MediaInfo> {
        match self {
            TitleFormat::Template(template) => template
                .capture(text)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|c| {
                    let info_type = slot_type(&c.slot)?;
                    let value = c.value.trim();
                    (!value.is_empty()).then(|| MediaInfo::new(info_type, value))
                })
                .collect(),
            TitleFormat::Regex { regex, .. } => regex
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim())
                .filter(|v| !v.is_empty())
                .map(|v| vec![MediaInfo::new(group_type, v)])
                .unwrap_or_default(),
        }
    }
}

impl Serialize for TitleFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn slot_type(slot: &str) -> Option<MediaInfoType> {
    match slot.to_ascii_lowercase().as_str() {
        "title" => Some(MediaInfoType::Title),
        "tab" => Some(MediaInfoType::Tab),
        "url" => Some(MediaInfoType::Url),
        "file" => Some(MediaInfoType::File),
        _ => None,
    }
}
