//! Logger that keeps messages in memory.

use crate::log::{LogLevel, Logger};
use parking_lot::Mutex;
use std::fmt::Arguments;

/// One recorded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Records every message so tests can assert on what was logged and at
/// which level.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Number of entries logged at exactly `level`.
    pub fn count_at(&self, level: LogLevel) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.level == level)
            .count()
    }

    /// Number of entries logged at `level` or above.
    pub fn count_at_least(&self, level: LogLevel) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.level >= level)
            .count()
    }

    /// Returns true if any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|entry| entry.message.contains(needle))
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        self.entries.lock().push(LogEntry {
            level,
            message: args.to_string(),
        });
    }
}
