use std::sync::Mutex;

use async_trait::async_trait;
use image::RgbImage;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{Capability, ProctorError};

use super::adapter::{MediaCapture, MediaStream, RecorderHandle};

const ALREADY_OWNED: &str = "screen capture is already owned by the test session";

/// A screen-capture request that was refused while the session owned the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignCaptureAttempt;

/// Wraps an adapter so only one screen-capture stream, the session's, can be live.
pub struct ExclusiveCapture<A> {
    inner: A,
    owned_screen: Mutex<Option<Uuid>>,
    refusals: Option<mpsc::UnboundedSender<ForeignCaptureAttempt>>,
}

impl<A: MediaCapture> ExclusiveCapture<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            owned_screen: Mutex::new(None),
            refusals: None,
        }
    }

    /// Like [`ExclusiveCapture::new`], and every refused request is also sent
    /// on the returned channel.
    pub fn with_refusal_reports(
        inner: A,
    ) -> (Self, mpsc::UnboundedReceiver<ForeignCaptureAttempt>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let capture = Self {
            refusals: Some(tx),
            ..Self::new(inner)
        };
        (capture, rx)
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn screen_owned(&self) -> bool {
        self.owned().is_some()
    }

    fn refuse(&self) -> ProctorError {
        if let Some(refusals) = &self.refusals {
            // Nobody may be watching.
            let _ = refusals.send(ForeignCaptureAttempt);
        }
        ProctorError::acquisition(Capability::Screen, ALREADY_OWNED)
    }

    fn owned(&self) -> std::sync::MutexGuard<'_, Option<Uuid>> {
        match self.owned_screen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl<A: MediaCapture> MediaCapture for ExclusiveCapture<A> {
    async fn acquire_camera(&self) -> Result<MediaStream, ProctorError> {
        self.inner.acquire_camera().await
    }

    async fn acquire_screen(&self) -> Result<MediaStream, ProctorError> {
        if self.screen_owned() {
            return Err(self.refuse());
        }

        let stream = self.inner.acquire_screen().await?;
        let mut owned = self.owned();
        if owned.is_some() {
            // Another acquisition finished while this one was pending.
            drop(owned);
            self.inner.release(&stream);
            return Err(self.refuse());
        }
        *owned = Some(stream.id);
        Ok(stream)
    }

    fn start_recording(&self, stream: &MediaStream) -> Result<RecorderHandle, ProctorError> {
        self.inner.start_recording(stream)
    }

    fn stop_recording(&self, handle: RecorderHandle) -> Result<Vec<u8>, ProctorError> {
        self.inner.stop_recording(handle)
    }

    fn capture_frame(&self, stream: &MediaStream) -> Result<RgbImage, ProctorError> {
        self.inner.capture_frame(stream)
    }

    fn release(&self, stream: &MediaStream) {
        {
            let mut owned = self.owned();
            if *owned == Some(stream.id) {
                *owned = None;
            }
        }
        self.inner.release(stream);
    }
}
