use serde_json::Value;
use tracing::warn;

use logweave_types::Labels;

/// Labels present with the same value in every set. No sets yields an empty
/// map; a single set is returned unchanged.
pub fn find_common_labels<'a>(label_sets: impl IntoIterator<Item = &'a Labels>) -> Labels {
    let mut sets = label_sets.into_iter();
    let Some(first) = sets.next() else {
        return Labels::new();
    };

    let mut common = first.clone();
    for set in sets {
        common.retain(|key, value| set.get(key) == Some(&*value));
        if common.is_empty() {
            break;
        }
    }
    common
}

/// Labels not part of the common set
pub fn find_unique_labels(labels: &Labels, common: &Labels) -> Labels {
    labels
        .iter()
        .filter(|(key, value)| common.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Render labels as `{key="value", ...}`
pub fn format_labels(labels: &Labels) -> String {
    let pairs: Vec<String> = labels
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", key, value))
        .collect();
    format!("{{{}}}", pairs.join(", "))
}

/// Label set from a per-row labels value. Non-string values are kept in
/// their JSON form.
pub(crate) fn labels_from_value(value: &Value) -> Option<Labels> {
    match value {
        Value::Object(map) => Some(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Null => None,
        other => {
            warn!(value = %other, "ignoring malformed label map");
            None
        }
    }
}
