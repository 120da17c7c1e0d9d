use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

use logweave_types::{DedupStrategy, LogEntry};

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?(?:Z|[+-][0-9]{2}:?[0-9]{2})",
    )
    .expect("ISO date pattern is valid")
});

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]").expect("digit pattern is valid"));

static WORD_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]").expect("word pattern is valid"));

/// The part of a line two rows must share to be duplicates
fn dedup_key(text: &str, strategy: DedupStrategy) -> Cow<'_, str> {
    match strategy {
        DedupStrategy::None => Cow::Borrowed(text),
        DedupStrategy::Exact => ISO_DATE.replace_all(text, ""),
        DedupStrategy::Numbers => DIGITS.replace_all(text, ""),
        DedupStrategy::Signature => WORD_CHARS.replace_all(text, ""),
    }
}

/// Whether two rows are equivalent under a strategy
pub fn is_duplicate_row(row: &LogEntry, other: &LogEntry, strategy: DedupStrategy) -> bool {
    match strategy {
        DedupStrategy::None => false,
        _ => dedup_key(&row.text, strategy) == dedup_key(&other.text, strategy),
    }
}

/// Collapse each row into the last kept row when equivalent, counting what
/// was folded in `duplicates`.
///
/// `None` returns the rows untouched. Rows that already carry a count keep
/// it, so re-running over a deduplicated set is a no-op and total counts are
/// conserved.
pub fn dedup_log_rows(rows: &[LogEntry], strategy: DedupStrategy) -> Vec<LogEntry> {
    if strategy == DedupStrategy::None {
        return rows.to_vec();
    }

    let mut result: Vec<LogEntry> = Vec::with_capacity(rows.len());
    let mut kept_key = String::new();

    for row in rows {
        let key = dedup_key(&row.text, strategy);
        let weight = row.duplicates.unwrap_or(0);

        if let Some(kept) = result.last_mut() {
            if key.as_ref() == kept_key.as_str() {
                *kept.duplicates.get_or_insert(0) += 1 + weight;
                continue;
            }
        }

        kept_key = key.into_owned();
        let mut kept = row.clone();
        kept.duplicates = Some(weight);
        result.push(kept);
    }

    result
}
