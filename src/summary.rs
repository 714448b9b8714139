use std::fmt;

use serde::{Deserialize, Serialize};

use crate::media::MediaState;
use crate::mouse::MouseSummary;
use crate::violations::ViolationCounters;

/// Structured export produced once per session, when it ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub duration_seconds: u64,
    pub tab_switches: u32,
    pub copy_paste_blocked: u32,
    pub screenshot_attempts: u32,
    pub idle_events: u32,
    pub snapshot_count: u32,
    pub mouse_distance: f64,
    pub coverage_percent: f64,
    pub exit_count: u32,
    pub jump_count: u32,
    pub idle_seconds: f64,
    pub total_violations: u32,
    pub screen_recording: bool,
}

impl SessionSummary {
    pub fn build(
        duration_ms: u64,
        counters: &ViolationCounters,
        media: &MediaState,
        mouse: &MouseSummary,
        screen_recording: bool,
    ) -> Self {
        Self {
            duration_seconds: duration_ms / 1000,
            tab_switches: counters.tab_switches,
            copy_paste_blocked: counters.copy_paste_blocked,
            screenshot_attempts: counters.screenshot_attempts,
            idle_events: counters.idle_events,
            snapshot_count: media.snapshot_count,
            mouse_distance: mouse.total_distance,
            coverage_percent: mouse.coverage_percent,
            exit_count: mouse.exit_count,
            jump_count: mouse.jump_count,
            idle_seconds: mouse.idle_seconds,
            total_violations: counters.total(),
            screen_recording,
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test Summary:")?;
        writeln!(
            f,
            "Time taken: {}m {}s",
            self.duration_seconds / 60,
            self.duration_seconds % 60
        )?;
        writeln!(f, "Tab switches: {}", self.tab_switches)?;
        writeln!(f, "Copy/Paste & Screenshots: {}", self.copy_paste_blocked)?;
        writeln!(f, "Screen capture attempts: {}", self.screenshot_attempts)?;
        writeln!(f, "Webcam snapshots: {}", self.snapshot_count)?;
        writeln!(
            f,
            "Screen recording: {}",
            if self.screen_recording { "Completed" } else { "Not available" }
        )?;
        writeln!(f)?;
        writeln!(f, "Mouse Activity Analysis:")?;
        writeln!(f, "Total mouse movement: {:.2} pixels", self.mouse_distance)?;
        writeln!(f, "Screen coverage: {:.2}%", self.coverage_percent)?;
        writeln!(f, "Mouse left browser: {} times", self.exit_count)?;
        writeln!(f, "Large mouse jumps: {}", self.jump_count)?;
        writeln!(f, "Idle timeouts: {}", self.idle_events)?;
        writeln!(f, "Total idle time: {:.1}s", self.idle_seconds)?;
        writeln!(f)?;
        write!(f, "Total violations: {}", self.total_violations)
    }
}

#[cfg(test)]
mod tests {
    use super::SessionSummary;
    use crate::media::MediaState;
    use crate::mouse::MouseSummary;
    use crate::violations::{CounterKind, ViolationCounters};

    #[test]
    fn total_violations_sums_counters_and_renders() {
        let mut counters = ViolationCounters::default();
        counters.increment(CounterKind::TabSwitches);
        counters.increment(CounterKind::CopyPasteBlocked);
        counters.increment(CounterKind::MouseJumps);

        let mouse = MouseSummary {
            total_distance: 707.1,
            coverage_percent: 12.5,
            jump_count: 1,
            ..MouseSummary::default()
        };
        let summary = SessionSummary::build(
            125_400,
            &counters,
            &MediaState::default(),
            &mouse,
            false,
        );

        assert_eq!(summary.duration_seconds, 125);
        assert_eq!(summary.total_violations, 3);

        let text = summary.to_string();
        assert!(text.contains("Time taken: 2m 5s"));
        assert!(text.contains("Screen recording: Not available"));
        assert!(text.ends_with("Total violations: 3"));

        let json = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(json["totalViolations"], 3);
        assert_eq!(json["copyPasteBlocked"], 1);
    }
}
