use serde::{Deserialize, Serialize};

use crate::activity_log::ActivityLogEntry;
use crate::media::MediaState;
use crate::mouse::MouseSummary;
use crate::violations::ViolationCounters;

use super::state::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptAction {
    /// Acknowledging the prompt issues a fullscreen request.
    ReenterFullscreen,
}

/// The pending warning overlay. A new warning replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub message: String,
    pub action: Option<PromptAction>,
}

impl Prompt {
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action: None,
        }
    }

    pub fn with_action(message: impl Into<String>, action: PromptAction) -> Self {
        Self {
            message: message.into(),
            action: Some(action),
        }
    }
}

/// Read-only snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub state: SessionStatus,
    pub session_id: Option<String>,
    pub elapsed: String,
    pub counters: ViolationCounters,
    pub recent_log: Vec<ActivityLogEntry>,
    pub mouse: MouseSummary,
    pub media: MediaState,
    pub fullscreen_compliant: bool,
    pub prompt: Option<Prompt>,
}

/// Renders view models. Implementations must not call back into the controller.
pub trait Presenter: Send + Sync {
    fn present(&self, view: &ViewModel);
}
