use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::error::Capability;
use crate::fullscreen::{request_fullscreen, FullscreenCapability};
use crate::language::Language;
use crate::media::{ForeignCaptureAttempt, MediaCapture, MediaStream, StreamKind};
use crate::mouse::PointerEvent;
use crate::summary::SessionSummary;
use crate::violations::{InputEvent, Verdict};

use super::monitor::{ProctorSession, Recording};
use super::monotonic_now;
use super::permissions::PermissionNegotiator;
use super::state::SessionStatus;
use super::tickers::{
    foreign_capture_loop, idle_loop, snapshot_loop, status_loop, SharedSession, Tickers,
};
use super::view::{Presenter, PromptAction, ViewModel};

/// Drives one proctoring session against the platform adapters.
///
/// The session state sits behind an async mutex that is never held across
/// an adapter await. Clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    session: SharedSession,
    media: Arc<dyn MediaCapture>,
    fullscreen: Arc<dyn FullscreenCapability>,
    presenter: Arc<dyn Presenter>,
    tickers: Arc<StdMutex<Tickers>>,
}

impl SessionController {
    pub fn new(
        config: MonitorConfig,
        verbose: bool,
        media: Arc<dyn MediaCapture>,
        fullscreen: Arc<dyn FullscreenCapability>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(ProctorSession::new(
                config,
                verbose,
                monotonic_now(),
            ))),
            media,
            fullscreen,
            presenter,
            tickers: Arc::new(StdMutex::new(Tickers::new())),
        }
    }

    pub async fn status(&self) -> SessionStatus {
        self.session.lock().await.status()
    }

    pub async fn snapshot(&self) -> ViewModel {
        self.session.lock().await.view_model(monotonic_now())
    }

    pub async fn summary(&self) -> Option<SessionSummary> {
        self.session.lock().await.summary().cloned()
    }

    pub async fn recording(&self) -> Option<Recording> {
        self.session.lock().await.recording().cloned()
    }

    pub fn tickers_running(&self) -> bool {
        self.lock_tickers().is_running()
    }

    pub async fn set_verbose(&self, verbose: bool) {
        self.session.lock().await.set_verbose(verbose);
    }

    /// Start a session: negotiate camera and screen access, then activate.
    ///
    /// Denied or failed capture narrows monitoring but never blocks the
    /// session. Errors only when a session is already starting or running.
    /// Dropping the future before it resolves puts the session back to
    /// NotStarted and releases any stream acquired so far.
    pub async fn start(&self) -> Result<SessionStatus> {
        let session_id = Uuid::new_v4().to_string();
        {
            let mut session = self.session.lock().await;
            session.begin(session_id.clone())?;
            session.permission_requested(Capability::Camera);
        }
        let mut rollback = StartRollback::new(self);
        info!("session {session_id} awaiting permissions");
        self.publish().await;

        let negotiator = PermissionNegotiator::new(self.media.as_ref());

        let camera = negotiator.request_webcam().await;
        {
            let mut session = self.session.lock().await;
            session.permission_resolved(Capability::Camera, camera);
            session.permission_requested(Capability::Screen);
        }
        self.publish().await;

        let screen = negotiator.request_screen().await;
        self.session
            .lock()
            .await
            .permission_resolved(Capability::Screen, screen);

        let status = self.activate().await;
        rollback.disarm();
        Ok(status)
    }

    /// Report refused foreign screen captures as violations.
    ///
    /// `attempts` comes from [`crate::media::ExclusiveCapture::with_refusal_reports`].
    /// The watcher runs until the capture wrapper is dropped.
    pub fn watch_foreign_captures(
        &self,
        attempts: mpsc::UnboundedReceiver<ForeignCaptureAttempt>,
    ) {
        tokio::spawn(foreign_capture_loop(
            self.session.clone(),
            self.presenter.clone(),
            attempts,
        ));
    }

    async fn activate(&self) -> SessionStatus {
        let mut session = self.session.lock().await;
        let now = monotonic_now();
        if !session.activate(Utc::now(), now, self.fullscreen.is_fullscreen()) {
            return session.status();
        }

        if let Some(screen) = session.screen_stream().cloned() {
            match self.media.start_recording(&screen) {
                Ok(handle) => session.recording_started(handle),
                Err(err) => {
                    warn!("screen recording unavailable: {err}");
                    if let Some(stream) = session.recording_failed(&err) {
                        self.media.release(&stream);
                    }
                }
            }
        }

        let camera = session.camera_stream().cloned();
        let config = session.config().clone();
        let view = session.view_model(now);
        drop(session);

        self.spawn_tickers(camera, &config);
        info!("session active");
        self.presenter.present(&view);
        SessionStatus::Active
    }

    fn spawn_tickers(&self, camera: Option<MediaStream>, config: &MonitorConfig) {
        let mut tickers = self.lock_tickers();
        tickers.shutdown();
        let token = tickers.token();

        tickers.spawn(idle_loop(
            self.session.clone(),
            self.presenter.clone(),
            config.tick_interval(),
            token.clone(),
        ));
        tickers.spawn(status_loop(
            self.session.clone(),
            self.fullscreen.clone(),
            self.presenter.clone(),
            config.tick_interval(),
            token.clone(),
        ));
        if let Some(camera) = camera {
            tickers.spawn(snapshot_loop(
                self.session.clone(),
                self.media.clone(),
                self.presenter.clone(),
                camera,
                config.snapshot_interval(),
                config.snapshot_jpeg_quality,
                token,
            ));
        }
    }

    /// End the active session and return its summary.
    ///
    /// Every ticker is cancelled before this returns, and every capture
    /// handle is stopped and released. Returns `None` when no session is
    /// active.
    pub async fn end(&self) -> Option<SessionSummary> {
        let mut session = self.session.lock().await;
        let now = monotonic_now();
        let handles = session.finish(Utc::now(), now)?;

        self.lock_tickers().shutdown();

        let recording = handles
            .recorder
            .and_then(|recorder| match self.media.stop_recording(recorder) {
                Ok(bytes) => Some(Recording::new(Utc::now(), bytes)),
                Err(err) => {
                    warn!("screen recording lost: {err}");
                    None
                }
            });
        for stream in handles.camera.iter().chain(handles.screen.iter()) {
            self.media.release(stream);
        }
        self.fullscreen.exit_fullscreen();

        let summary = session.conclude(recording);
        let view = session.view_model(now);
        drop(session);

        info!(
            "session ended after {}s with {} violations",
            summary.duration_seconds, summary.total_violations
        );
        self.presenter.present(&view);
        Some(summary)
    }

    /// Classify a page event. The caller suppresses the native action when
    /// the verdict says so.
    pub async fn handle_input(&self, event: InputEvent) -> Verdict {
        let (verdict, view) = {
            let mut session = self.session.lock().await;
            let verdict = session.handle_input(&event);
            (verdict, session.view_model(monotonic_now()))
        };
        if verdict.classification.is_some() || verdict.debug.is_some() {
            self.presenter.present(&view);
        }
        verdict
    }

    pub async fn handle_pointer(&self, event: PointerEvent) {
        let view = {
            let mut session = self.session.lock().await;
            let now = monotonic_now();
            session
                .handle_pointer(&event, now)
                .then(|| session.view_model(now))
        };
        if let Some(view) = view {
            self.presenter.present(&view);
        }
    }

    /// The platform reported a fullscreen change.
    pub async fn on_fullscreen_change(&self) {
        self.session
            .lock()
            .await
            .fullscreen_changed(self.fullscreen.is_fullscreen());
        self.publish().await;
    }

    /// Hide the pending prompt and run its action. Runs inside the user's
    /// gesture, so this is where fullscreen requests are issued.
    pub async fn acknowledge_warning(&self) {
        let action = self.session.lock().await.acknowledge();
        if let Some(PromptAction::ReenterFullscreen) = action {
            let result = request_fullscreen(self.fullscreen.as_ref());
            self.session
                .lock()
                .await
                .fullscreen_result(result, self.fullscreen.is_fullscreen());
        }
        self.publish().await;
    }

    pub async fn change_language(&self, language: Language) -> &'static str {
        let template = self.session.lock().await.change_language(language);
        self.publish().await;
        template
    }

    pub async fn on_track_ended(&self, kind: StreamKind) {
        self.session.lock().await.track_ended(kind);
        self.publish().await;
    }

    async fn publish(&self) {
        let view = self.snapshot().await;
        self.presenter.present(&view);
    }

    fn lock_tickers(&self) -> MutexGuard<'_, Tickers> {
        match self.tickers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Puts a session back to NotStarted when `start()` is dropped before it
/// activates, releasing whatever negotiation had already acquired.
struct StartRollback<'a> {
    controller: &'a SessionController,
    armed: bool,
}

impl<'a> StartRollback<'a> {
    fn new(controller: &'a SessionController) -> Self {
        Self {
            controller,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for StartRollback<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let session = self.controller.session.clone();
        let media = self.controller.media.clone();
        if let Ok(mut guard) = session.try_lock() {
            abandon_start(&mut guard, media.as_ref());
            return;
        }
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    abandon_start(&mut *session.lock().await, media.as_ref());
                });
            }
            Err(_) => warn!("session left awaiting permissions: no runtime to roll it back"),
        }
    }
}

fn abandon_start(session: &mut ProctorSession, media: &dyn MediaCapture) {
    let Some(handles) = session.abandon_start() else {
        return;
    };
    warn!("session start abandoned during permission negotiation");
    for stream in handles.camera.iter().chain(handles.screen.iter()) {
        media.release(stream);
    }
}
