use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunable thresholds for the session monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorConfig {
    /// Pointer moves longer than this (in CSS pixels) count as a jump.
    pub jump_threshold: f64,

    /// Edge length of a coverage grid cell.
    pub grid_size: f64,

    /// Idle time before the one-shot inactivity warning.
    pub idle_warning_secs: u64,
    /// Idle time before the user is considered away.
    pub idle_timeout_secs: u64,

    /// Period of the idle and fullscreen refresh loops.
    pub tick_millis: u64,
    /// Period of the webcam snapshot loop.
    pub snapshot_interval_secs: u64,

    pub display_log_entries: usize,
    pub movement_history_len: usize,
    /// Selections longer than this many characters are reported.
    pub large_selection_chars: usize,
    pub snapshot_jpeg_quality: u8,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            jump_threshold: 150.0,
            grid_size: 50.0,
            idle_warning_secs: 20,
            idle_timeout_secs: 30,
            tick_millis: 1_000,
            snapshot_interval_secs: 10,
            display_log_entries: 20,
            movement_history_len: 100,
            large_selection_chars: 50,
            snapshot_jpeg_quality: 80,
        }
    }
}

impl MonitorConfig {
    pub fn idle_warning(&self) -> Duration {
        Duration::from_secs(self.idle_warning_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs.max(1))
    }
}
