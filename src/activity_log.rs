use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_DISPLAY_ENTRIES: usize = 20;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LogCategory {
    Info,
    Warning,
    Debug,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub message: String,
    pub category: LogCategory,
    pub timestamp: DateTime<Utc>,
}

/// Append-only record of everything the monitor noticed during a session.
///
/// The full history is kept for the summary; only the newest entries are
/// handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: Vec<ActivityLogEntry>,
    display_limit: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_ENTRIES)
    }
}

impl ActivityLog {
    pub fn new(display_limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            display_limit: display_limit.max(1),
        }
    }

    pub fn push(&mut self, category: LogCategory, message: impl Into<String>) -> &ActivityLogEntry {
        let message = message.into();
        match category {
            LogCategory::Info => log::info!("[activity] {message}"),
            LogCategory::Warning => log::warn!("[activity] {message}"),
            LogCategory::Debug => log::debug!("[activity] {message}"),
        }

        self.entries.push(ActivityLogEntry {
            message,
            category,
            timestamp: Utc::now(),
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogCategory::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogCategory::Warning, message);
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.push(LogCategory::Debug, message);
    }

    /// Newest entries, oldest first, capped at the display limit.
    pub fn recent(&self) -> &[ActivityLogEntry] {
        let start = self.entries.len().saturating_sub(self.display_limit);
        &self.entries[start..]
    }

    pub fn entries(&self) -> &[ActivityLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
