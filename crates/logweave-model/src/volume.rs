//! Per-level log counts over time
//!
//! Level series are kept aligned on the same buckets so they can be stacked:
//! whenever one level opens a bucket, every level already seen gets a zero
//! point there too.

use tracing::debug;

use logweave_types::{FieldType, Frame, LogEntry, LogLevel, VolumePoint, VolumeSeries};

use crate::config::VolumeConfig;
use crate::labels::format_labels;
use crate::level::level_from_labels;
use crate::time::parse_time_ms;

/// Running series for one level
struct LevelSeries {
    level: LogLevel,
    last_bucket: Option<i64>,
    points: Vec<VolumePoint>,
}

impl LevelSeries {
    fn new(level: LogLevel) -> Self {
        Self {
            level,
            last_bucket: None,
            points: Vec::new(),
        }
    }

    fn open_bucket(&mut self, time: i64, count: f64) {
        self.points.push(VolumePoint { time, count });
        self.last_bucket = Some(time);
    }

    fn finish(mut self) -> VolumeSeries {
        // Zero points are appended as other levels open buckets
        self.points.sort_by_key(|p| p.time);
        VolumeSeries {
            name: self.level.as_str().to_string(),
            level: self.level,
            points: self.points,
        }
    }
}

/// Count rows per level in fixed-width time buckets. Returns no series when
/// the interval is absent or not positive.
pub fn build_volume_series(
    rows: &[LogEntry],
    interval_ms: Option<i64>,
    config: &VolumeConfig,
) -> Vec<VolumeSeries> {
    let Some(bucket_size) = config.bucket_size(interval_ms) else {
        debug!(?interval_ms, "no usable interval, skipping volume series");
        return Vec::new();
    };

    let mut sorted: Vec<&LogEntry> = rows.iter().collect();
    sorted.sort_by_key(|row| row.time_epoch_ms);

    let mut series: Vec<LevelSeries> = Vec::new();
    for row in sorted {
        let bucket = row.time_epoch_ms.div_euclid(bucket_size) * bucket_size;
        let index = match series.iter().position(|s| s.level == row.level) {
            Some(index) => index,
            None => {
                series.push(LevelSeries::new(row.level));
                series.len() - 1
            }
        };

        if series[index].last_bucket == Some(bucket) {
            if let Some(point) = series[index].points.last_mut() {
                point.count += 1.0;
            }
            continue;
        }

        series[index].open_bucket(bucket, 1.0);
        for (other_index, other) in series.iter_mut().enumerate() {
            if other_index != index && other.last_bucket != Some(bucket) {
                other.open_bucket(bucket, 0.0);
            }
        }
    }

    series.into_iter().map(LevelSeries::finish).collect()
}

/// Series carried by a metric-shaped frame: one per number field, named by
/// its labels.
pub fn metric_frame_series(frame: &Frame) -> Vec<VolumeSeries> {
    let Some(time_field) = frame.first_field_of_type(FieldType::Time) else {
        debug!(name = ?frame.name, "metric frame has no time field");
        return Vec::new();
    };

    frame
        .fields
        .iter()
        .filter(|f| f.field_type == FieldType::Number)
        .map(|field| {
            let level = field
                .labels
                .as_ref()
                .and_then(level_from_labels)
                .unwrap_or(LogLevel::Unknown);
            let name = match &field.labels {
                Some(labels) if !labels.is_empty() => format_labels(labels),
                _ => field.name.clone(),
            };
            let points = (0..frame.len())
                .filter_map(|row| {
                    let time = time_field.get(row).and_then(parse_time_ms)?;
                    let count = field.get(row)?.as_f64()?;
                    Some(VolumePoint { time, count })
                })
                .collect();
            VolumeSeries {
                name,
                level,
                points,
            }
        })
        .collect()
}
