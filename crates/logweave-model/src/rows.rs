use chrono::DateTime;
use serde_json::Value;
use tracing::warn;

use logweave_types::{Labels, LogEntry};

use crate::frame::LogFrame;
use crate::labels::labels_from_value;
use crate::level::{LevelSources, resolve_level};
use crate::time::{DisplayTimeZone, parse_time_ms, parse_time_ns};

/// Entries built from one log-shaped frame
#[derive(Debug, Default)]
pub(crate) struct FrameRows {
    pub entries: Vec<LogEntry>,
    /// Label sets this frame contributes to the common-label computation
    pub label_sets: Vec<Labels>,
}

/// Build one entry per row of a log-shaped frame. Unique labels are filled
/// in later, once the labels of every frame are known.
pub(crate) fn build_rows(source: &LogFrame<'_>, time_zone: &DisplayTimeZone) -> FrameRows {
    let frame = source.frame;
    let mut rows = FrameRows {
        entries: Vec::with_capacity(frame.len()),
        label_sets: Vec::new(),
    };

    if source.labels_field.is_none() {
        if let Some(labels) = &source.body_field.labels {
            rows.label_sets.push(labels.clone());
        }
    }

    for row in 0..frame.len() {
        let time_value = source.time_field.get(row).unwrap_or(&Value::Null);
        let Some((time_epoch_ms, timestamp)) = parse_time_ms(time_value)
            .and_then(|ms| DateTime::from_timestamp_millis(ms).map(|ts| (ms, ts)))
        else {
            warn!(frame = source.index, row, value = %time_value, "skipping row with unparseable time");
            continue;
        };

        let text = source.body_field.get(row).map(value_to_text).unwrap_or_default();

        let labels = match source.labels_field {
            Some(field) => {
                let labels = field.get(row).and_then(labels_from_value);
                if let Some(labels) = &labels {
                    rows.label_sets.push(labels.clone());
                }
                labels
            }
            None => source.body_field.labels.clone(),
        };

        let level = resolve_level(&LevelSources {
            field_value: source.level_field.and_then(|f| f.get(row)),
            labels: labels.as_ref(),
            text: &text,
        });

        let id = source
            .id_field
            .and_then(|f| f.get(row))
            .and_then(value_to_id)
            .unwrap_or_else(|| row.to_string());
        // Ids are only unique within the query that produced them
        let uid = match &frame.ref_id {
            Some(ref_id) => format!("{}_{}", ref_id, id),
            None => id,
        };

        rows.entries.push(LogEntry {
            uid,
            frame_index: source.index,
            row_index: row,
            ref_id: frame.ref_id.clone(),
            timestamp,
            time_epoch_ms,
            time_epoch_ns: parse_time_ns(
                source.time_ns_field.and_then(|f| f.get(row)),
                time_epoch_ms,
            ),
            time_display: time_zone.format(&timestamp),
            has_ansi: text.contains('\u{1b}'),
            text,
            level,
            unique_labels: Labels::new(),
            labels,
            search_words: frame.meta.search_words.clone(),
            duplicates: None,
        });
    }

    rows
}

/// Display text for a value. Non-text values are serialized structurally.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(value_to_text(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameShape, classify_frame};
    use logweave_types::{Field, FieldType, Frame, FrameMeta, LogLevel};
    use serde_json::json;

    fn log_frame(frame: &Frame) -> LogFrame<'_> {
        match classify_frame(0, frame) {
            FrameShape::Logs(log_frame) => log_frame,
            other => panic!("expected a log-shaped frame, got {other:?}"),
        }
    }

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_build_rows() {
        let frame = Frame::new(vec![
            Field::new(
                "time",
                FieldType::Time,
                vec![
                    json!("2019-04-26T09:28:11.352440161Z"),
                    json!("2019-04-26T14:42:50.991981292Z"),
                ],
            ),
            Field::strings(
                "message",
                [
                    "t=2019-04-26T11:05:28+0200 lvl=info msg=\"Initializing\" logger=server",
                    "t=2019-04-26T16:42:50+0200 lvl=eror msg=\"new token\"",
                ],
            )
            .with_labels(labels(&[("job", "grafana")])),
            Field::strings("id", ["foo", "bar"]),
        ])
        .with_ref_id("A")
        .with_meta(FrameMeta {
            search_words: vec!["token".to_string()],
            ..Default::default()
        });

        let built = build_rows(&log_frame(&frame), &DisplayTimeZone::Utc);
        assert_eq!(built.entries.len(), 2);
        assert_eq!(built.label_sets, vec![labels(&[("job", "grafana")])]);

        let first = &built.entries[0];
        assert_eq!(first.uid, "A_foo");
        assert_eq!(first.level, LogLevel::Info);
        assert_eq!(first.time_epoch_ms, 1_556_270_891_352);
        assert_eq!(first.time_epoch_ns, 1_556_270_891_352_000_000);
        assert_eq!(first.time_display, "2019-04-26 09:28:11.352");
        assert_eq!(first.ref_id.as_deref(), Some("A"));
        assert_eq!(first.search_words, vec!["token".to_string()]);
        assert_eq!(first.duplicates, None);

        assert_eq!(built.entries[1].uid, "A_bar");
        assert_eq!(built.entries[1].level, LogLevel::Error);
        assert_eq!(built.entries[1].row_index, 1);
    }

    #[test]
    fn test_uid_falls_back_to_row_index() {
        let frame = Frame::new(vec![
            Field::times_ms("ts", [0, 1]),
            Field::strings("line", ["a", "b"]),
        ]);
        let built = build_rows(&log_frame(&frame), &DisplayTimeZone::Utc);
        let uids: Vec<&str> = built.entries.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, vec!["0", "1"]);
        assert!(built.label_sets.is_empty());
        assert!(built.entries[0].labels.is_none());
    }

    #[test]
    fn test_uid_scoped_by_ref_id() {
        let frame = Frame::new(vec![
            Field::times_ms("ts", [0, 1]),
            Field::strings("line", ["a", "b"]),
        ])
        .with_ref_id("B");
        let built = build_rows(&log_frame(&frame), &DisplayTimeZone::Utc);
        let uids: Vec<&str> = built.entries.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, vec!["B_0", "B_1"]);
    }

    #[test]
    fn test_level_field_overrides_text() {
        let frame = Frame::new(vec![
            Field::times_ms("time", [1000]),
            Field::strings("message", ["WARN boooo"]),
            Field::strings("level", ["dbug"]),
        ]);
        let built = build_rows(&log_frame(&frame), &DisplayTimeZone::Utc);
        assert_eq!(built.entries[0].level, LogLevel::Debug);
    }

    #[test]
    fn test_per_row_labels_field() {
        let frame = Frame::new(vec![
            Field::new(
                "labels",
                FieldType::Other,
                vec![json!({"node": "first", "level": "err"}), json!({"node": "second"})],
            ),
            Field::times_ms("time", [1, 2]),
            Field::strings("line", ["one", "two"]),
        ]);
        let built = build_rows(&log_frame(&frame), &DisplayTimeZone::Utc);
        assert_eq!(built.label_sets.len(), 2);
        assert_eq!(
            built.entries[0].labels,
            Some(labels(&[("level", "err"), ("node", "first")]))
        );
        assert_eq!(built.entries[0].level, LogLevel::Error);
        assert_eq!(built.entries[1].level, LogLevel::Unknown);
    }

    #[test]
    fn test_text_coercion_and_missing_values() {
        let frame = Frame::new(vec![
            Field::times_ms("time", [1, 2, 3]),
            Field::new(
                "line",
                FieldType::String,
                vec![json!({"msg": "hi"}), Value::Null, json!(42)],
            ),
        ]);
        let built = build_rows(&log_frame(&frame), &DisplayTimeZone::Utc);
        let texts: Vec<&str> = built.entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec![r#"{"msg":"hi"}"#, "", "42"]);
    }

    #[test]
    fn test_unparseable_time_row_is_skipped() {
        let frame = Frame::new(vec![
            Field::new("time", FieldType::Time, vec![json!("soon"), json!(5)]),
            Field::strings("line", ["bad", "good"]),
        ]);
        let built = build_rows(&log_frame(&frame), &DisplayTimeZone::Utc);
        assert_eq!(built.entries.len(), 1);
        assert_eq!(built.entries[0].text, "good");
        assert_eq!(built.entries[0].uid, "1");
    }

    #[test]
    fn test_high_precision_time_field() {
        let frame = Frame::new(vec![
            Field::times_ms("time", [1, 2]),
            Field::strings("line", ["a", "b"]),
            Field::strings("tsNs", ["1000123", "garbage"]),
        ]);
        let built = build_rows(&log_frame(&frame), &DisplayTimeZone::Utc);
        assert_eq!(built.entries[0].time_epoch_ns, 1_000_123);
        assert_eq!(built.entries[1].time_epoch_ns, 2_000_000);
    }

    #[test]
    fn test_ansi_detection() {
        let frame = Frame::new(vec![
            Field::times_ms("time", [1]),
            Field::strings("line", ["Line with ANSI \u{1b}[31mwarn\u{1b}[0m et dolor"]),
        ]);
        let built = build_rows(&log_frame(&frame), &DisplayTimeZone::Utc);
        assert!(built.entries[0].has_ansi);
        assert_eq!(built.entries[0].level, LogLevel::Warning);
    }
}
