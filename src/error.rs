use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A platform capability the monitor depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    Camera,
    Screen,
    Recording,
    Fullscreen,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Camera => "webcam",
            Capability::Screen => "screen capture",
            Capability::Recording => "screen recording",
            Capability::Fullscreen => "fullscreen",
        };
        f.write_str(name)
    }
}

/// Capability failures. None of these end a session; they narrow what gets monitored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProctorError {
    #[error("{0} permission denied by user")]
    PermissionDenied(Capability),

    #[error("{capability} is not available: {reason}")]
    CapabilityUnavailable {
        capability: Capability,
        reason: String,
    },

    #[error("failed to access {capability}: {reason}")]
    AcquisitionFailure {
        capability: Capability,
        reason: String,
    },
}

impl ProctorError {
    pub fn unavailable(capability: Capability, reason: impl Into<String>) -> Self {
        ProctorError::CapabilityUnavailable {
            capability,
            reason: reason.into(),
        }
    }

    pub fn acquisition(capability: Capability, reason: impl Into<String>) -> Self {
        ProctorError::AcquisitionFailure {
            capability,
            reason: reason.into(),
        }
    }

    pub fn is_denial(&self) -> bool {
        matches!(self, ProctorError::PermissionDenied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{Capability, ProctorError};

    #[test]
    fn messages_name_the_capability() {
        assert_eq!(
            ProctorError::PermissionDenied(Capability::Camera).to_string(),
            "webcam permission denied by user"
        );
        assert_eq!(
            ProctorError::unavailable(Capability::Fullscreen, "API missing").to_string(),
            "fullscreen is not available: API missing"
        );
        let err = ProctorError::acquisition(Capability::Screen, "NotReadableError");
        assert!(!err.is_denial());
        assert!(ProctorError::PermissionDenied(Capability::Screen).is_denial());
    }
}
