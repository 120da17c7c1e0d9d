//! Model assembly: frames in, one merged log model out.

use std::collections::HashSet;

use tracing::debug;

use logweave_types::{DedupStrategy, Frame, Labels, LogEntry, LogsModel, MetaItem, MetaValue};

use crate::config::ModelConfig;
use crate::dedup::dedup_log_rows;
use crate::frame::{FrameShape, LogFrame, classify_frame};
use crate::identity::resolve_identities;
use crate::labels::{find_common_labels, find_unique_labels};
use crate::rows::build_rows;
use crate::time::DisplayTimeZone;
use crate::volume::{build_volume_series, metric_frame_series};

pub const COMMON_LABELS: &str = "Common labels";
pub const LIMIT_LABEL: &str = "Line limit";
pub const BYTES_LABEL: &str = "Total bytes processed";

/// Stat holding processed bytes when a frame does not name its own
pub const DEFAULT_VOLUME_STAT_KEY: &str = "Summary: total bytes processed";

const BYTE_UNITS: &[&str] = &["B", "kB", "MB", "GB", "TB", "PB"];

/// Query time range, epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

impl TimeRange {
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    pub fn duration_ms(&self) -> i64 {
        self.to - self.from
    }
}

/// Builds log models with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct LogsModelBuilder {
    config: ModelConfig,
    time_range: Option<TimeRange>,
}

impl LogsModelBuilder {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            time_range: None,
        }
    }

    /// Range the frames were queried over. When the line limit is hit, the
    /// limit meta reports how much of it the returned rows cover.
    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = Some(time_range);
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Merge every log-shaped frame into one time-ordered model.
    ///
    /// Frames that are not log-shaped either pass through as series (metric
    /// frames) or only feed the meta items (empty frames). Without any
    /// log-shaped frame the result is the empty model.
    pub fn build(&self, frames: &[Frame], interval_ms: Option<i64>, time_zone: &str) -> LogsModel {
        let mut log_frames: Vec<LogFrame<'_>> = Vec::new();
        let mut metric_frames: Vec<&Frame> = Vec::new();
        for (index, frame) in frames.iter().enumerate() {
            match classify_frame(index, frame) {
                FrameShape::Logs(log_frame) => log_frames.push(log_frame),
                FrameShape::Metrics(frame) => {
                    debug!(index, name = ?frame.name, "frame is not log-shaped, treating as series");
                    metric_frames.push(frame);
                }
                FrameShape::Empty(_) => debug!(index, "empty frame contributes meta only"),
            }
        }

        if log_frames.is_empty() {
            return LogsModel::default();
        }

        let time_zone = DisplayTimeZone::parse(time_zone);
        let mut rows: Vec<LogEntry> = Vec::new();
        let mut label_sets: Vec<Labels> = Vec::new();
        for log_frame in &log_frames {
            let frame_rows = build_rows(log_frame, &time_zone);
            rows.extend(frame_rows.entries);
            label_sets.extend(frame_rows.label_sets);
        }

        // Identities resolve in input order; the sort is stable so survivors
        // still end up in time order
        if self.config.resolve_identities {
            rows = resolve_identities(rows);
        }

        let common_labels = find_common_labels(&label_sets);
        let mut has_unique_labels = false;
        for row in &mut rows {
            if let Some(labels) = &row.labels {
                row.unique_labels = find_unique_labels(labels, &common_labels);
                has_unique_labels |= !row.unique_labels.is_empty();
            }
        }

        rows.sort_by_key(|row| (row.time_epoch_ms, row.time_epoch_ns));

        let meta = build_meta(frames, common_labels, &rows, self.time_range.as_ref());

        if self.config.dedup_strategy != DedupStrategy::None {
            rows = dedup_log_rows(&rows, self.config.dedup_strategy);
        }

        let series = if metric_frames.is_empty() {
            build_volume_series(&rows, interval_ms, &self.config.volume)
        } else {
            metric_frames
                .iter()
                .flat_map(|frame| metric_frame_series(frame))
                .collect()
        };

        debug!(
            frames = frames.len(),
            rows = rows.len(),
            series = series.len(),
            "built logs model"
        );

        LogsModel {
            rows,
            has_unique_labels,
            meta,
            series,
        }
    }
}

/// Build a model with the default configuration
pub fn transform(frames: &[Frame], interval_ms: Option<i64>, time_zone: &str) -> LogsModel {
    LogsModelBuilder::default().build(frames, interval_ms, time_zone)
}

/// Meta items for a merged frame set. `returned` are the rows after identity
/// resolution, sorted by time.
fn build_meta(
    frames: &[Frame],
    common_labels: Labels,
    returned: &[LogEntry],
    time_range: Option<&TimeRange>,
) -> Vec<MetaItem> {
    let mut meta = Vec::new();

    if !common_labels.is_empty() {
        meta.push(MetaItem::new(
            COMMON_LABELS,
            MetaValue::LabelsMap(common_labels),
        ));
    }

    let limits = first_per_ref_id(frames, |frame| frame.meta.limit);
    if !limits.is_empty() {
        let total: u64 = limits.iter().sum();
        let coverage = time_range.and_then(|range| limit_coverage(returned, total, range));
        let value = coverage
            .unwrap_or_else(|| format!("{} ({} returned)", total, returned.len()));
        meta.push(MetaItem::new(LIMIT_LABEL, MetaValue::String(value)));
    }

    let total_bytes: f64 = first_per_ref_id(frames, processed_bytes).iter().sum();
    if total_bytes > 0.0 {
        meta.push(MetaItem::new(
            BYTES_LABEL,
            MetaValue::String(format_bytes(total_bytes)),
        ));
    }

    let mut seen_errors: HashSet<&str> = HashSet::new();
    for frame in frames {
        if let Some(error) = frame.meta.error.as_deref() {
            if seen_errors.insert(error) {
                meta.push(MetaItem::new("", MetaValue::Error(error.to_string())));
            }
        }
    }

    meta
}

/// How much of the query range the rows cover, once the limit cut them off
fn limit_coverage(returned: &[LogEntry], limit: u64, range: &TimeRange) -> Option<String> {
    let shown = returned.len();
    if shown == 0 || (shown as u64) < limit || range.duration_ms() <= 0 {
        return None;
    }
    let (first, last) = (returned.first()?, returned.last()?);
    let covered = last.time_epoch_ms - first.time_epoch_ms;
    let percent = covered as f64 / range.duration_ms() as f64 * 100.0;
    let noun = if shown == 1 { "line" } else { "lines" };
    Some(format!(
        "{} {} shown - {:.2}% ({}) of {}",
        shown,
        noun,
        percent,
        format_duration(covered),
        format_duration(range.duration_ms())
    ))
}

/// Duration as `5h 14min 40sec`, rounded to the second
pub fn format_duration(ms: i64) -> String {
    let total_secs = (ms.max(0) + 500) / 1000;
    let parts: Vec<String> = [
        (total_secs / 3600, "h"),
        (total_secs % 3600 / 60, "min"),
        (total_secs % 60, "sec"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, unit)| format!("{}{}", n, unit))
    .collect();

    if parts.is_empty() {
        "0sec".to_string()
    } else {
        parts.join(" ")
    }
}

fn processed_bytes(frame: &Frame) -> Option<f64> {
    let key = frame
        .meta
        .volume_stat_key
        .as_deref()
        .unwrap_or(DEFAULT_VOLUME_STAT_KEY);
    frame
        .meta
        .stats
        .iter()
        .find(|stat| stat.display_name == key)
        .map(|stat| stat.value)
}

/// One value per ref id, taken from the first frame that has one
fn first_per_ref_id<T>(frames: &[Frame], value: impl Fn(&Frame) -> Option<T>) -> Vec<T> {
    let mut seen: HashSet<Option<&str>> = HashSet::new();
    frames
        .iter()
        .filter_map(|frame| {
            let found = value(frame)?;
            seen.insert(frame.ref_id.as_deref()).then_some(found)
        })
        .collect()
}

/// Human-scaled byte count in decimal units
pub fn format_bytes(bytes: f64) -> String {
    if bytes < 1000.0 {
        return format!("{} B", bytes.round());
    }

    let mut value = bytes;
    let mut unit = 0;
    while value >= 1000.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    let decimals = if value < 10.0 {
        2
    } else if value < 100.0 {
        1
    } else {
        0
    };
    format!("{:.*} {}", decimals, value, BYTE_UNITS[unit])
}
