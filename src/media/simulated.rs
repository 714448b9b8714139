use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Capability, ProctorError};

use super::adapter::{MediaCapture, MediaStream, RecorderHandle, StreamKind};

const FRAME_WIDTH: u32 = 64;
const FRAME_HEIGHT: u32 = 48;

/// How the simulated user and platform answer a capture request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SimulatedGrant {
    #[default]
    Allow,
    Deny,
    Fail(String),
    Unavailable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatedMediaConfig {
    pub camera: SimulatedGrant,
    pub screen: SimulatedGrant,
    pub recording_fails: bool,
}

#[derive(Debug, Default)]
struct SimulatedInner {
    live: HashMap<Uuid, StreamKind>,
    recorders: HashMap<Uuid, u32>,
    frames_captured: u32,
}

/// Media adapter with scripted answers, for hosts without devices and for tests.
#[derive(Debug, Default)]
pub struct SimulatedCapture {
    config: SimulatedMediaConfig,
    inner: Mutex<SimulatedInner>,
}

impl SimulatedCapture {
    pub fn new(config: SimulatedMediaConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(SimulatedInner::default()),
        }
    }

    pub fn granting() -> Self {
        Self::new(SimulatedMediaConfig::default())
    }

    pub fn live_streams(&self) -> usize {
        self.lock().live.len()
    }

    pub fn frames_captured(&self) -> u32 {
        self.lock().frames_captured
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimulatedInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn acquire(&self, grant: &SimulatedGrant, kind: StreamKind) -> Result<MediaStream, ProctorError> {
        let capability = match kind {
            StreamKind::Camera => Capability::Camera,
            StreamKind::Screen => Capability::Screen,
        };
        match grant {
            SimulatedGrant::Allow => {
                let stream = MediaStream::new(kind);
                self.lock().live.insert(stream.id, kind);
                Ok(stream)
            }
            SimulatedGrant::Deny => Err(ProctorError::PermissionDenied(capability)),
            SimulatedGrant::Fail(reason) => Err(ProctorError::acquisition(capability, reason.clone())),
            SimulatedGrant::Unavailable => Err(ProctorError::unavailable(
                capability,
                "mediaDevices API not supported",
            )),
        }
    }
}

#[async_trait]
impl MediaCapture for SimulatedCapture {
    async fn acquire_camera(&self) -> Result<MediaStream, ProctorError> {
        self.acquire(&self.config.camera, StreamKind::Camera)
    }

    async fn acquire_screen(&self) -> Result<MediaStream, ProctorError> {
        self.acquire(&self.config.screen, StreamKind::Screen)
    }

    fn start_recording(&self, stream: &MediaStream) -> Result<RecorderHandle, ProctorError> {
        if self.config.recording_fails {
            return Err(ProctorError::acquisition(
                Capability::Recording,
                "no supported webm codec",
            ));
        }
        let mut inner = self.lock();
        if !inner.live.contains_key(&stream.id) {
            return Err(ProctorError::acquisition(
                Capability::Recording,
                "stream is no longer live",
            ));
        }
        let handle = RecorderHandle {
            id: Uuid::new_v4(),
            stream_id: stream.id,
        };
        inner.recorders.insert(handle.id, 0);
        Ok(handle)
    }

    fn stop_recording(&self, handle: RecorderHandle) -> Result<Vec<u8>, ProctorError> {
        let mut inner = self.lock();
        inner.recorders.remove(&handle.id).ok_or_else(|| {
            ProctorError::acquisition(Capability::Recording, "recorder already stopped")
        })?;
        let mut blob = b"\x1aE\xdf\xa3webm".to_vec();
        blob.extend_from_slice(handle.stream_id.as_bytes());
        Ok(blob)
    }

    fn capture_frame(&self, stream: &MediaStream) -> Result<RgbImage, ProctorError> {
        let mut inner = self.lock();
        if !inner.live.contains_key(&stream.id) {
            return Err(ProctorError::acquisition(
                Capability::Camera,
                "stream is no longer live",
            ));
        }
        inner.frames_captured += 1;
        let shade = (inner.frames_captured * 37 % 256) as u8;
        Ok(RgbImage::from_fn(FRAME_WIDTH, FRAME_HEIGHT, |x, y| {
            Rgb([shade, (x * 4) as u8, (y * 5) as u8])
        }))
    }

    fn release(&self, stream: &MediaStream) {
        self.lock().live.remove(&stream.id);
    }
}
