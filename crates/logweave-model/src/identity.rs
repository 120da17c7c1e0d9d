use std::collections::HashSet;

use tracing::debug;

use logweave_types::LogEntry;

/// Where an identity is unique: the query that produced the row, or the
/// frame itself when it carries no ref id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum IdentityScope {
    Query(String),
    Frame(usize),
}

fn identity_key(row: &LogEntry) -> (IdentityScope, String) {
    let scope = match &row.ref_id {
        Some(ref_id) => IdentityScope::Query(ref_id.clone()),
        None => IdentityScope::Frame(row.frame_index),
    };
    (scope, row.uid.clone())
}

/// Keep the first entry seen for each identity and drop later ones.
/// Surviving entries keep their relative order, so this expects rows in
/// input order.
pub fn resolve_identities(rows: Vec<LogEntry>) -> Vec<LogEntry> {
    let before = rows.len();
    let mut seen: HashSet<(IdentityScope, String)> = HashSet::with_capacity(before);
    let resolved: Vec<LogEntry> = rows
        .into_iter()
        .filter(|row| seen.insert(identity_key(row)))
        .collect();

    if resolved.len() < before {
        debug!(
            dropped = before - resolved.len(),
            "collapsed entries sharing an identity"
        );
    }
    resolved
}
