use serde::Serialize;
use std::collections::VecDeque;

use crate::clock;

/// Maximum number of entries retained in the activity log.
pub const MAX_ENTRIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Wall-clock time the entry was recorded (`HH:MM:SS`).
    pub at: String,
    pub message: String,
}

/// Bounded ring buffer of human-readable events. Entries are stored oldest
/// first; [`ActivityLog::iter`] yields them most recent first.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(MAX_ENTRIES),
        }
    }

    pub fn record(&mut self, message: impl Into<String>) {
        if self.entries.len() >= MAX_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            at: clock::time_of_day(),
            message: message.into(),
        });
    }

    /// Entries, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().rev()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.iter().cloned().collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
