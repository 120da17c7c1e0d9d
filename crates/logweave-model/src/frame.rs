//! Frame classification
//!
//! Every input frame is classified exactly once as log-shaped, metric-shaped
//! or empty before any further processing.

use logweave_types::{Field, FieldType, Frame};

/// Names of the nanosecond-precision time field
pub const TIME_NS_FIELD_NAMES: &[&str] = &["tsNs", "ts_ns"];

/// Preferred names of the content field
pub const LINE_FIELD_NAMES: &[&str] = &["line", "body"];

/// Names of an explicit per-row level field (case-insensitive)
pub const LEVEL_FIELD_NAMES: &[&str] = &["level", "detected_level"];

/// Candidate names of the id field, first match wins
pub const ID_FIELD_NAMES: &[&str] = &["id", "uid", "_id"];

/// Name of a field holding one label map per row
pub const LABELS_FIELD_NAME: &str = "labels";

/// A frame's role in the model
#[derive(Debug)]
pub enum FrameShape<'a> {
    /// Has a time field and a string field
    Logs(LogFrame<'a>),
    /// Anything else with rows, treated as a pre-computed volume series
    Metrics(&'a Frame),
    /// No rows and not log-shaped; only contributes meta
    Empty(&'a Frame),
}

/// The fields of a log-shaped frame, resolved once
#[derive(Debug, Clone, Copy)]
pub struct LogFrame<'a> {
    /// Position of the frame in the transform input
    pub index: usize,
    pub frame: &'a Frame,
    pub time_field: &'a Field,
    pub time_ns_field: Option<&'a Field>,
    pub body_field: &'a Field,
    pub level_field: Option<&'a Field>,
    pub id_field: Option<&'a Field>,
    pub labels_field: Option<&'a Field>,
}

pub fn classify_frame(index: usize, frame: &Frame) -> FrameShape<'_> {
    match LogFrame::resolve(index, frame) {
        Some(log_frame) => FrameShape::Logs(log_frame),
        None if frame.is_empty() => FrameShape::Empty(frame),
        None => FrameShape::Metrics(frame),
    }
}

impl<'a> LogFrame<'a> {
    fn resolve(index: usize, frame: &'a Frame) -> Option<Self> {
        let time_field = frame.first_field_of_type(FieldType::Time)?;
        let body_field = find_body_field(frame)?;

        let time_ns_field = frame
            .fields
            .iter()
            .find(|f| TIME_NS_FIELD_NAMES.contains(&f.name.as_str()));
        let level_field = frame
            .fields
            .iter()
            .find(|f| is_one_of(&f.name, LEVEL_FIELD_NAMES) && !std::ptr::eq(*f, body_field));
        let id_field = ID_FIELD_NAMES.iter().find_map(|name| frame.field(name));
        let labels_field = frame
            .fields
            .iter()
            .find(|f| f.name == LABELS_FIELD_NAME && f.field_type == FieldType::Other);

        Some(Self {
            index,
            frame,
            time_field,
            time_ns_field,
            body_field,
            level_field,
            id_field,
            labels_field,
        })
    }
}

/// Content field: a conventionally named line field, else the first string
/// field that is not an id, level or nanosecond field, else any string field.
fn find_body_field(frame: &Frame) -> Option<&Field> {
    let mut strings = frame
        .fields
        .iter()
        .filter(|f| f.field_type == FieldType::String);

    strings
        .clone()
        .find(|f| is_one_of(&f.name, LINE_FIELD_NAMES))
        .or_else(|| strings.clone().find(|f| !is_reserved(&f.name)))
        .or_else(|| strings.next())
}

fn is_reserved(name: &str) -> bool {
    is_one_of(name, LEVEL_FIELD_NAMES)
        || ID_FIELD_NAMES.contains(&name)
        || TIME_NS_FIELD_NAMES.contains(&name)
}

fn is_one_of(name: &str, candidates: &[&str]) -> bool {
    candidates.iter().any(|c| name.eq_ignore_ascii_case(c))
}
