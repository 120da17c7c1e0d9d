use std::collections::HashSet;

use logweave_types::{LogEntry, LogLevel};

/// Drop rows whose level is hidden. An empty set keeps everything.
pub fn filter_log_levels(rows: &[LogEntry], hidden_levels: &HashSet<LogLevel>) -> Vec<LogEntry> {
    if hidden_levels.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .filter(|row| !hidden_levels.contains(&row.level))
        .cloned()
        .collect()
}

/// Counts per log level
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub critical: usize,
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub debug: usize,
    pub trace: usize,
    pub unknown: usize,
}

impl LevelCounts {
    /// Count rows per level, including the rows folded into each by dedup
    pub fn from_rows(rows: &[LogEntry]) -> Self {
        let mut counts = Self::default();
        for row in rows {
            let n = 1 + row.duplicates.unwrap_or(0);
            match row.level {
                LogLevel::Critical => counts.critical += n,
                LogLevel::Error => counts.error += n,
                LogLevel::Warning => counts.warning += n,
                LogLevel::Info => counts.info += n,
                LogLevel::Debug => counts.debug += n,
                LogLevel::Trace => counts.trace += n,
                LogLevel::Unknown => counts.unknown += n,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.critical + self.error + self.warning + self.info + self.debug + self.trace + self.unknown
    }
}
