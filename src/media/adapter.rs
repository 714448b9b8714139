use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProctorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamKind {
    Camera,
    Screen,
}

/// Handle to a live capture stream owned by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStream {
    pub id: Uuid,
    pub kind: StreamKind,
}

impl MediaStream {
    pub fn new(kind: StreamKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderHandle {
    pub id: Uuid,
    pub stream_id: Uuid,
}

/// Platform media capture: camera, screen capture, recording and frame grabs.
///
/// Acquisition is the only suspension point; everything else answers
/// immediately.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn acquire_camera(&self) -> Result<MediaStream, ProctorError>;
    async fn acquire_screen(&self) -> Result<MediaStream, ProctorError>;
    fn start_recording(&self, stream: &MediaStream) -> Result<RecorderHandle, ProctorError>;
    /// Stop a recorder and hand back the encoded recording.
    fn stop_recording(&self, handle: RecorderHandle) -> Result<Vec<u8>, ProctorError>;
    fn capture_frame(&self, stream: &MediaStream) -> Result<RgbImage, ProctorError>;
    /// Stop every track of the stream.
    fn release(&self, stream: &MediaStream);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaState {
    pub webcam_active: bool,
    pub screen_recording: bool,
    pub snapshot_count: u32,
}
