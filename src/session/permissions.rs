use crate::activity_log::LogCategory;
use crate::error::{Capability, ProctorError};
use crate::media::{MediaCapture, MediaStream};

/// Result of asking for one capture stream. Negotiation never fails; a
/// failed acquisition degrades to monitoring without that stream.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureGrant {
    Granted(MediaStream),
    Denied,
    Failed(ProctorError),
}

impl CaptureGrant {
    fn from_result(result: Result<MediaStream, ProctorError>) -> Self {
        match result {
            Ok(stream) => CaptureGrant::Granted(stream),
            Err(err) if err.is_denial() => CaptureGrant::Denied,
            Err(err) => CaptureGrant::Failed(err),
        }
    }

}

/// What the session should log and show for a negotiation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionNotice {
    pub level: LogCategory,
    pub message: String,
    pub prompt: Option<String>,
}

impl PermissionNotice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: LogCategory::Info,
            message: message.into(),
            prompt: None,
        }
    }

    fn warning(message: impl Into<String>, prompt: Option<&str>) -> Self {
        Self {
            level: LogCategory::Warning,
            message: message.into(),
            prompt: prompt.map(str::to_string),
        }
    }
}

/// Requests the camera, then the screen, one after the other.
pub struct PermissionNegotiator<'a> {
    media: &'a dyn MediaCapture,
}

impl<'a> PermissionNegotiator<'a> {
    pub fn new(media: &'a dyn MediaCapture) -> Self {
        Self { media }
    }

    pub async fn request_webcam(&self) -> CaptureGrant {
        CaptureGrant::from_result(self.media.acquire_camera().await)
    }

    pub async fn request_screen(&self) -> CaptureGrant {
        CaptureGrant::from_result(self.media.acquire_screen().await)
    }
}

/// Logged before a capture request goes out.
pub fn request_notice(capability: Capability) -> PermissionNotice {
    match capability {
        Capability::Camera => PermissionNotice::info("Requesting webcam permission for proctoring"),
        _ => PermissionNotice::info("Requesting screen recording permission"),
    }
}

/// Logged once the platform answered a capture request.
pub fn grant_notice(capability: Capability, grant: &CaptureGrant) -> PermissionNotice {
    match (capability, grant) {
        (Capability::Camera, CaptureGrant::Granted(_)) => {
            PermissionNotice::info("Webcam initialized successfully")
        }
        (Capability::Camera, CaptureGrant::Denied) => {
            PermissionNotice::warning("Webcam permission denied by user", None)
        }
        (Capability::Camera, CaptureGrant::Failed(err)) => PermissionNotice::warning(
            format!("Webcam initialization failed: {err}"),
            Some("Webcam access failed. Proceeding to screen recording request."),
        ),
        (_, CaptureGrant::Granted(_)) => PermissionNotice::info("Screen recording initialized"),
        (_, CaptureGrant::Denied) => PermissionNotice::warning(
            "Screen recording permission denied by user",
            Some("Screen recording access denied. Test will continue with limited monitoring."),
        ),
        (_, CaptureGrant::Failed(err)) => PermissionNotice::warning(
            format!("Screen recording initialization failed: {err}"),
            Some("Screen recording access failed. Test will continue without screen monitoring."),
        ),
    }
}
