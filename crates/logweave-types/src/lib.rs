//! Shared types for logweave
//!
//! This crate contains the tabular inputs consumed by the model builder and
//! the log model it produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Key/value label set. Ordered so output is deterministic.
pub type Labels = BTreeMap<String, String>;

// ============================================================================
// Tabular Input Types
// ============================================================================

/// Semantic type of a frame field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Time,
    String,
    Number,
    #[default]
    Other,
}

/// A named column of a frame
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Labels attached to the whole field, not to individual rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    pub values: Vec<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            field_type,
            labels: None,
            values,
        }
    }

    /// Time field holding epoch milliseconds
    pub fn times_ms(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::new(
            name,
            FieldType::Time,
            values.into_iter().map(Value::from).collect(),
        )
    }

    /// String field
    pub fn strings<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(
            name,
            FieldType::String,
            values.into_iter().map(|v| Value::String(v.into())).collect(),
        )
    }

    /// Number field
    pub fn numbers(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(
            name,
            FieldType::Number,
            values.into_iter().map(Value::from).collect(),
        )
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Value at a row index (None when out of range)
    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A name/value statistic reported by the query layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryStat {
    pub display_name: String,
    pub value: f64,
}

impl QueryStat {
    pub fn new(display_name: impl Into<String>, value: f64) -> Self {
        Self {
            display_name: display_name.into(),
            value,
        }
    }
}

/// Result metadata attached to a frame
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameMeta {
    /// Row limit the query ran with
    pub limit: Option<u64>,
    pub stats: Vec<QueryStat>,
    /// Name of the stat in `stats` that carries processed bytes
    pub volume_stat_key: Option<String>,
    /// Highlighting terms, passed through to entries untouched
    pub search_words: Vec<String>,
    /// Error reported by the query layer
    pub error: Option<String>,
}

/// One tabular query result
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    pub name: Option<String>,
    /// Correlates frames produced by the same query
    pub ref_id: Option<String>,
    pub fields: Vec<Field>,
    pub meta: FrameMeta,
}

impl Frame {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_meta(mut self, meta: FrameMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Row count (longest field)
    pub fn len(&self) -> usize {
        self.fields.iter().map(Field::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find a field by exact name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn first_field_of_type(&self, field_type: FieldType) -> Option<&Field> {
        self.fields.iter().find(|f| f.field_type == field_type)
    }

    pub fn has_field_of_type(&self, field_type: FieldType) -> bool {
        self.first_field_of_type(field_type).is_some()
    }
}

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Trace,
    #[default]
    Unknown,
}

/// Level vocabulary in classification order, with the aliases each level
/// accepts.
pub const LEVEL_ALIASES: &[(LogLevel, &[&str])] = &[
    (
        LogLevel::Critical,
        &["critical", "crit", "fatal", "emerg", "alert", "panic"],
    ),
    (LogLevel::Error, &["error", "err", "eror", "erro"]),
    (LogLevel::Warning, &["warning", "warn", "wrn"]),
    (
        LogLevel::Info,
        &["info", "information", "informational", "notice", "inf"],
    ),
    (LogLevel::Debug, &["debug", "dbug", "dbg"]),
    (LogLevel::Trace, &["trace", "trc"]),
];

impl LogLevel {
    /// Parse log level from common formats
    pub fn from_str(s: &str) -> Self {
        let lower = s.trim().to_lowercase();
        LEVEL_ALIASES
            .iter()
            .find(|(_, aliases)| aliases.contains(&lower.as_str()))
            .map(|(level, _)| *level)
            .unwrap_or(Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured log entry built from one frame row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Identity used to collapse the same event reported twice
    pub uid: String,

    /// Index of the source frame in the transform input
    pub frame_index: usize,

    /// Row index within the source frame
    pub row_index: usize,

    /// Correlation id of the source frame
    pub ref_id: Option<String>,

    pub timestamp: DateTime<Utc>,
    pub time_epoch_ms: i64,
    pub time_epoch_ns: i64,

    /// Timestamp formatted in the display time zone
    pub time_display: String,

    /// The raw line
    pub text: String,

    pub level: LogLevel,

    /// Label set of the source field (or per-row labels field)
    pub labels: Option<Labels>,

    /// `labels` minus the labels common to every input
    pub unique_labels: Labels,

    pub search_words: Vec<String>,

    /// Whether `text` carries ANSI escape sequences
    pub has_ansi: bool,

    /// Number of adjacent rows folded into this one. `None` when not deduplicated.
    pub duplicates: Option<usize>,
}

impl LogEntry {
    /// Create a new log entry with minimal fields
    pub fn new(uid: impl Into<String>, text: impl Into<String>, time_epoch_ms: i64) -> Self {
        Self {
            uid: uid.into(),
            frame_index: 0,
            row_index: 0,
            ref_id: None,
            timestamp: DateTime::from_timestamp_millis(time_epoch_ms).unwrap_or_default(),
            time_epoch_ms,
            time_epoch_ns: time_epoch_ms.saturating_mul(1_000_000),
            time_display: String::new(),
            text: text.into(),
            level: LogLevel::Unknown,
            labels: None,
            unique_labels: Labels::new(),
            search_words: Vec::new(),
            has_ansi: false,
            duplicates: None,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }
}

// ============================================================================
// Model Types
// ============================================================================

/// Value of a summary item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
#[non_exhaustive]
pub enum MetaValue {
    String(String),
    LabelsMap(Labels),
    Error(String),
}

/// Summary item shown alongside the rows
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaItem {
    pub label: String,
    #[serde(flatten)]
    pub value: MetaValue,
}

impl MetaItem {
    pub fn new(label: impl Into<String>, value: MetaValue) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// One bucket of a volume series
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumePoint {
    /// Bucket start, epoch milliseconds
    pub time: i64,
    pub count: f64,
}

/// Per-level count series over time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumeSeries {
    pub name: String,
    pub level: LogLevel,
    pub points: Vec<VolumePoint>,
}

impl VolumeSeries {
    pub fn times(&self) -> Vec<i64> {
        self.points.iter().map(|p| p.time).collect()
    }

    pub fn counts(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.count).collect()
    }
}

/// The result of a transform
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogsModel {
    pub rows: Vec<LogEntry>,
    pub has_unique_labels: bool,
    pub meta: Vec<MetaItem>,
    pub series: Vec<VolumeSeries>,
}

impl LogsModel {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.meta.is_empty() && self.series.is_empty()
    }
}

/// How adjacent equivalent rows are collapsed, loosest to strictest
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DedupStrategy {
    #[default]
    None,
    Exact,
    Numbers,
    Signature,
}

impl DedupStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Exact => "exact",
            Self::Numbers => "numbers",
            Self::Signature => "signature",
        }
    }
}

impl fmt::Display for DedupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DedupStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "exact" => Ok(Self::Exact),
            "numbers" => Ok(Self::Numbers),
            "signature" => Ok(Self::Signature),
            other => Err(format!("unknown dedup strategy '{}'", other)),
        }
    }
}
