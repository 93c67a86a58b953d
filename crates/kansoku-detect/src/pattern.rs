//! Glob patterns for executable names and window classes.

use regex::Regex;
use serde::{Serialize, Serializer};

/// A `*`/`?` glob matched against a whole name.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Pattern for executable names. Matching ignores case.
    pub fn executable(source: &str) -> Result<Self, regex::Error> {
        Self::compile(source, true)
    }

    /// Pattern for window class names. Matching is case-sensitive.
    pub fn window_class(source: &str) -> Result<Self, regex::Error> {
        Self::compile(source, false)
    }

    fn compile(source: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = Regex::new(&glob_to_regex(source, case_insensitive))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern names a file extension, e.g. `vlc.exe` or `*.exe`.
    pub fn has_extension(&self) -> bool {
        self.source.contains('.')
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

fn glob_to_regex(glob: &str, case_insensitive: bool) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    if case_insensitive {
        out.push_str("(?i)");
    }
    out.push('^');
    let mut literal = String::new();
    for c in glob.chars() {
        match c {
            '*' | '?' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str(if c == '*' { ".*" } else { "." });
            }
            c => literal.push(c),
        }
    }
    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}
