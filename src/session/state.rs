use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    #[default]
    NotStarted,
    AwaitingPermissions,
    Active,
    Ended,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::NotStarted => "Not Started",
            SessionStatus::AwaitingPermissions => "Awaiting Permissions",
            SessionStatus::Active => "In Progress",
            SessionStatus::Ended => "Completed",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub elapsed_ms: u64,
    /// Monotonic start of the active window; combines with `now` to give elapsed time.
    #[serde(skip)]
    pub running_anchor: Option<Instant>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn can_start(&self) -> bool {
        matches!(self.status, SessionStatus::NotStarted | SessionStatus::Ended)
    }

    pub fn current_elapsed_ms(&self, now: Instant) -> u64 {
        if let (SessionStatus::Active, Some(anchor)) = (self.status, self.running_anchor) {
            now.saturating_duration_since(anchor).as_millis() as u64
        } else {
            self.elapsed_ms
        }
    }

    pub fn sync_elapsed(&mut self, now: Instant) {
        self.elapsed_ms = self.current_elapsed_ms(now);
    }

    /// Wipe the previous session and wait for media permissions.
    pub fn request_start(&mut self, session_id: String) {
        *self = Self {
            status: SessionStatus::AwaitingPermissions,
            session_id: Some(session_id),
            ..Self::default()
        };
    }

    pub fn activate(&mut self, started_at: DateTime<Utc>, now: Instant) {
        self.status = SessionStatus::Active;
        self.started_at = Some(started_at);
        self.elapsed_ms = 0;
        self.running_anchor = Some(now);
    }

    pub fn end(&mut self, ended_at: DateTime<Utc>, now: Instant) {
        self.sync_elapsed(now);
        self.status = SessionStatus::Ended;
        self.ended_at = Some(ended_at);
        self.running_anchor = None;
    }

    /// Elapsed time as `HH:MM:SS`.
    pub fn clock(&self, now: Instant) -> String {
        let elapsed = self.current_elapsed_ms(now) / 1000;
        format!(
            "{:02}:{:02}:{:02}",
            elapsed / 3600,
            (elapsed % 3600) / 60,
            elapsed % 60
        )
    }
}
