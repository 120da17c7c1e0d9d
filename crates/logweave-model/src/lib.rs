//! Log model construction for logweave
//!
//! This crate turns tabular query results into one time-ordered,
//! deduplicated stream of log entries with labels, meta and volume series.

mod config;
mod dedup;
mod filter;
mod frame;
mod identity;
mod labels;
mod level;
mod model;
mod rows;
mod time;
mod volume;

pub use config::{ConfigError, ModelConfig, VolumeConfig};
pub use dedup::{dedup_log_rows, is_duplicate_row};
pub use filter::{LevelCounts, filter_log_levels};
pub use frame::{FrameShape, LogFrame, classify_frame};
pub use identity::resolve_identities;
pub use labels::{find_common_labels, find_unique_labels, format_labels};
pub use level::{classify_level, strip_ansi};
pub use model::{
    BYTES_LABEL, COMMON_LABELS, DEFAULT_VOLUME_STAT_KEY, LIMIT_LABEL, LogsModelBuilder, TimeRange,
    format_bytes, format_duration, transform,
};
pub use time::{DisplayTimeZone, parse_time_ms, parse_time_ns};
pub use volume::{build_volume_series, metric_frame_series};

// Re-export types used in our public API
pub use logweave_types::{
    DedupStrategy, Field, FieldType, Frame, FrameMeta, Labels, LogEntry, LogLevel, LogsModel,
    MetaItem, MetaValue, QueryStat, VolumePoint, VolumeSeries,
};
