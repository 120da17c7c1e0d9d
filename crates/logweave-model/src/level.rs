use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

use logweave_types::{LEVEL_ALIASES, Labels, LogLevel};

/// Whole-word, case-insensitive pattern per level, in vocabulary order
static LEVEL_PATTERNS: LazyLock<Vec<(LogLevel, Regex)>> = LazyLock::new(|| {
    LEVEL_ALIASES
        .iter()
        .map(|(level, aliases)| {
            let pattern = format!(r"(?i)\b(?:{})\b", aliases.join("|"));
            (*level, Regex::new(&pattern).expect("level pattern is valid"))
        })
        .collect()
});

static ANSI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("ANSI pattern is valid"));

/// Remove ANSI escape sequences
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_PATTERN.replace_all(text, "")
}

/// Infer a level from a log line. The first vocabulary entry that matches
/// anywhere in the line wins, regardless of where it appears.
pub fn classify_level(line: &str) -> Option<LogLevel> {
    if line.is_empty() {
        return None;
    }
    let clean = strip_ansi(line);
    LEVEL_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&clean))
        .map(|(level, _)| *level)
}

/// Level from a `level` label (key matched case-insensitively)
pub(crate) fn level_from_labels(labels: &Labels) -> Option<LogLevel> {
    labels
        .iter()
        .find(|(key, value)| key.eq_ignore_ascii_case("level") && !value.trim().is_empty())
        .map(|(_, value)| LogLevel::from_str(value))
}

/// Everything a row offers for level resolution
pub(crate) struct LevelSources<'a> {
    /// Value of the row's explicit level field
    pub field_value: Option<&'a Value>,
    /// The row's label set
    pub labels: Option<&'a Labels>,
    pub text: &'a str,
}

type LevelResolver = fn(&LevelSources<'_>) -> Option<LogLevel>;

/// Tried in order, first hit wins
const LEVEL_RESOLVERS: &[LevelResolver] = &[from_level_field, from_level_label, from_text];

pub(crate) fn resolve_level(sources: &LevelSources<'_>) -> LogLevel {
    LEVEL_RESOLVERS
        .iter()
        .find_map(|resolve| resolve(sources))
        .unwrap_or(LogLevel::Unknown)
}

fn from_level_field(sources: &LevelSources<'_>) -> Option<LogLevel> {
    match sources.field_value? {
        Value::String(value) if !value.trim().is_empty() => Some(LogLevel::from_str(value)),
        _ => None,
    }
}

fn from_level_label(sources: &LevelSources<'_>) -> Option<LogLevel> {
    sources.labels.and_then(level_from_labels)
}

fn from_text(sources: &LevelSources<'_>) -> Option<LogLevel> {
    classify_level(sources.text)
}
