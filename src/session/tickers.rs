use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::fullscreen::FullscreenCapability;
use crate::media::{encode_snapshot, ForeignCaptureAttempt, MediaCapture, MediaStream, Snapshot};
use crate::violations::InputEvent;

use super::monitor::ProctorSession;
use super::monotonic_now;
use super::view::Presenter;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub type SharedSession = Arc<Mutex<ProctorSession>>;

/// Background loops of one active session. They share a cancellation token
/// and are aborted as a group.
pub struct Tickers {
    handles: Vec<JoinHandle<()>>,
    cancel_token: CancellationToken,
}

impl Tickers {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.handles.push(tokio::spawn(task));
    }

    pub fn is_running(&self) -> bool {
        self.handles.iter().any(|handle| !handle.is_finished())
    }

    /// Cancel and abort every loop. Returns without waiting for them.
    pub fn shutdown(&mut self) {
        self.cancel_token.cancel();
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        self.cancel_token = CancellationToken::new();
    }
}

impl Default for Tickers {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Tickers {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn interval(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Mouse idle detection.
pub async fn idle_loop(
    session: SharedSession,
    presenter: Arc<dyn Presenter>,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = interval(period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let view = {
                    let mut guard = session.lock().await;
                    let now = monotonic_now();
                    let logged = guard.log().len();
                    guard.idle_tick(now);
                    (guard.log().len() != logged).then(|| guard.view_model(now))
                };
                if let Some(view) = view {
                    presenter.present(&view);
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("idle loop shutting down");
                break;
            }
        }
    }
}

/// Refreshes the fullscreen compliance flag and the elapsed clock. Never prompts.
pub async fn status_loop(
    session: SharedSession,
    fullscreen: Arc<dyn FullscreenCapability>,
    presenter: Arc<dyn Presenter>,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = interval(period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let view = {
                    let mut guard = session.lock().await;
                    guard.refresh_fullscreen(fullscreen.is_fullscreen());
                    guard.view_model(monotonic_now())
                };
                presenter.present(&view);
            }
            _ = cancel_token.cancelled() => {
                log_info!("status loop shutting down");
                break;
            }
        }
    }
}

/// Periodic webcam snapshots; the first one is taken right away.
pub async fn snapshot_loop(
    session: SharedSession,
    media: Arc<dyn MediaCapture>,
    presenter: Arc<dyn Presenter>,
    camera: MediaStream,
    period: Duration,
    quality: u8,
    cancel_token: CancellationToken,
) {
    let mut ticker = interval(period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(view) = take_snapshot(&session, media.as_ref(), &camera, quality).await {
                    presenter.present(&view);
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("snapshot loop shutting down");
                break;
            }
        }
    }
}

/// Turns screen captures refused by the exclusive wrapper into violations.
/// Lives across sessions; outside an active one the attempts are ignored.
pub async fn foreign_capture_loop(
    session: SharedSession,
    presenter: Arc<dyn Presenter>,
    mut attempts: mpsc::UnboundedReceiver<ForeignCaptureAttempt>,
) {
    while attempts.recv().await.is_some() {
        let view = {
            let mut guard = session.lock().await;
            let verdict = guard.handle_input(&InputEvent::ScreenCaptureRequest);
            verdict
                .classification
                .is_some()
                .then(|| guard.view_model(monotonic_now()))
        };
        match view {
            Some(view) => presenter.present(&view),
            None => log_info!("foreign screen capture refused outside an active session"),
        }
    }
    log_info!("foreign capture watcher stopped");
}

async fn take_snapshot(
    session: &SharedSession,
    media: &dyn MediaCapture,
    camera: &MediaStream,
    quality: u8,
) -> Option<super::view::ViewModel> {
    {
        let guard = session.lock().await;
        if !guard.is_active() || !guard.media().webcam_active {
            return None;
        }
    }

    let frame = match media.capture_frame(camera) {
        Ok(frame) => frame,
        Err(err) => {
            log_warn!("webcam frame capture failed: {err}");
            return None;
        }
    };
    let jpeg = match encode_snapshot(&frame, quality) {
        Ok(jpeg) => jpeg,
        Err(err) => {
            log_error!("webcam snapshot dropped: {err:?}");
            return None;
        }
    };

    let mut guard = session.lock().await;
    let snapshot = Snapshot {
        taken_at: Utc::now(),
        jpeg,
    };
    guard
        .record_snapshot(snapshot)
        .then(|| guard.view_model(monotonic_now()))
}
