use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;
use proctor_lib::activity_log::LogCategory;
use proctor_lib::fullscreen::{FullscreenCapability, SimulatedFullscreen};
use proctor_lib::media::{
    ExclusiveCapture, MediaCapture, MediaStream, RecorderHandle, SimulatedCapture,
    SimulatedGrant, SimulatedMediaConfig, StreamKind,
};
use proctor_lib::mouse::{PointerEvent, Viewport};
use proctor_lib::session::{Presenter, PromptAction, SessionController, SessionStatus, ViewModel};
use proctor_lib::violations::{InputEvent, Modifiers};
use proctor_lib::{MonitorConfig, ProctorError};

#[derive(Default)]
struct CollectingPresenter {
    views: Mutex<Vec<ViewModel>>,
}

impl CollectingPresenter {
    fn last(&self) -> Option<ViewModel> {
        self.views.lock().unwrap().last().cloned()
    }

    fn count(&self) -> usize {
        self.views.lock().unwrap().len()
    }
}

impl Presenter for CollectingPresenter {
    fn present(&self, view: &ViewModel) {
        self.views.lock().unwrap().push(view.clone());
    }
}

struct Harness {
    controller: SessionController,
    media: Arc<ExclusiveCapture<SimulatedCapture>>,
    fullscreen: Arc<SimulatedFullscreen>,
    presenter: Arc<CollectingPresenter>,
}

fn harness(media: SimulatedMediaConfig) -> Harness {
    let (media, refusals) = ExclusiveCapture::with_refusal_reports(SimulatedCapture::new(media));
    let media = Arc::new(media);
    let fullscreen = Arc::new(SimulatedFullscreen::new(true));
    let presenter = Arc::new(CollectingPresenter::default());
    let controller = SessionController::new(
        MonitorConfig::default(),
        false,
        media.clone(),
        fullscreen.clone(),
        presenter.clone(),
    );
    controller.watch_foreign_captures(refusals);
    Harness {
        controller,
        media,
        fullscreen,
        presenter,
    }
}

fn denied() -> SimulatedMediaConfig {
    SimulatedMediaConfig {
        camera: SimulatedGrant::Deny,
        screen: SimulatedGrant::Deny,
        recording_fails: false,
    }
}

#[tokio::test(start_paused = true)]
async fn denied_permissions_still_activate() {
    let h = harness(denied());

    let status = h.controller.start().await.expect("start");
    assert_eq!(status, SessionStatus::Active);

    let view = h.controller.snapshot().await;
    assert!(!view.media.webcam_active);
    assert!(!view.media.screen_recording);
    assert!(view.recent_log.iter().any(|entry| {
        entry.category == LogCategory::Warning
            && entry.message == "Webcam permission denied by user"
    }));
    assert!(h.controller.tickers_running());

    h.controller.end().await.expect("summary");
}

#[tokio::test(start_paused = true)]
async fn start_while_running_is_rejected() {
    let h = harness(denied());
    h.controller.start().await.expect("start");

    assert!(h.controller.start().await.is_err());
    assert_eq!(h.controller.status().await, SessionStatus::Active);
}

#[tokio::test(start_paused = true)]
async fn end_releases_everything_and_is_idempotent() {
    let h = harness(SimulatedMediaConfig::default());
    h.controller.start().await.expect("start");
    assert_eq!(h.media.inner().live_streams(), 2);
    assert!(h.media.screen_owned());

    h.controller.acknowledge_warning().await;
    assert!(h.fullscreen.is_fullscreen());

    tokio::time::sleep(Duration::from_secs(25)).await;

    let summary = h.controller.end().await.expect("summary");
    assert!(summary.snapshot_count >= 2);
    assert!(summary.screen_recording);
    assert_eq!(summary.duration_seconds, 25);

    assert_eq!(h.media.inner().live_streams(), 0);
    assert!(!h.controller.tickers_running());
    assert!(!h.fullscreen.is_fullscreen());
    assert!(h.controller.recording().await.is_some());

    let presented = h.presenter.count();
    assert!(h.controller.end().await.is_none());
    assert_eq!(h.controller.status().await, SessionStatus::Ended);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.presenter.count(), presented);
}

#[tokio::test(start_paused = true)]
async fn idle_timeout_is_counted_and_timed() {
    let h = harness(denied());
    h.controller.start().await.expect("start");

    tokio::time::sleep(Duration::from_millis(31_500)).await;
    let view = h.controller.snapshot().await;
    assert_eq!(view.counters.idle_events, 1);
    assert!(view.mouse.currently_idle);

    let viewport = Viewport::new(1280.0, 720.0);
    h.controller
        .handle_pointer(PointerEvent::Move {
            x: 10.0,
            y: 10.0,
            viewport,
        })
        .await;

    let summary = h.controller.end().await.expect("summary");
    assert_eq!(summary.idle_events, 1);
    assert!(summary.idle_seconds > 0.0);
    assert_eq!(summary.total_violations, 1);
}

#[tokio::test(start_paused = true)]
async fn violations_reach_the_presenter() {
    let h = harness(denied());
    h.controller.start().await.expect("start");

    let verdict = h
        .controller
        .handle_input(InputEvent::key_down("v", Modifiers::ctrl()))
        .await;
    assert!(verdict.suppress_default);
    h.controller
        .handle_input(InputEvent::Visibility { hidden: true })
        .await;

    let view = h.presenter.last().expect("presented");
    assert_eq!(view.counters.copy_paste_blocked, 1);
    assert_eq!(view.counters.tab_switches, 1);
    assert_eq!(
        view.prompt.map(|prompt| prompt.message),
        Some("Tab switching detected! This may be considered cheating.".to_string())
    );

    let summary = h.controller.end().await.expect("summary");
    assert_eq!(summary.total_violations, 2);
}

#[tokio::test(start_paused = true)]
async fn leaving_fullscreen_prompts_for_reentry() {
    let h = harness(denied());
    h.controller.start().await.expect("start");
    h.controller.acknowledge_warning().await;
    assert!(h.controller.snapshot().await.fullscreen_compliant);

    h.fullscreen.set_active(false);
    h.controller.on_fullscreen_change().await;

    let view = h.controller.snapshot().await;
    assert!(!view.fullscreen_compliant);
    assert_eq!(
        view.prompt.and_then(|prompt| prompt.action),
        Some(PromptAction::ReenterFullscreen)
    );

    h.controller.acknowledge_warning().await;
    assert!(h.fullscreen.is_fullscreen());
    assert!(h.controller.snapshot().await.prompt.is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_recording_releases_the_screen() {
    let h = harness(SimulatedMediaConfig {
        camera: SimulatedGrant::Deny,
        screen: SimulatedGrant::Allow,
        recording_fails: true,
    });
    h.controller.start().await.expect("start");

    let view = h.controller.snapshot().await;
    assert!(!view.media.screen_recording);
    assert_eq!(h.media.inner().live_streams(), 0);
    assert!(!h.media.screen_owned());

    let summary = h.controller.end().await.expect("summary");
    assert!(!summary.screen_recording);
}

#[tokio::test(start_paused = true)]
async fn stopped_screen_share_is_reported() {
    let h = harness(SimulatedMediaConfig {
        camera: SimulatedGrant::Deny,
        ..SimulatedMediaConfig::default()
    });
    h.controller.start().await.expect("start");
    h.controller.on_track_ended(StreamKind::Screen).await;

    let view = h.controller.snapshot().await;
    assert!(!view.media.screen_recording);
    assert!(view
        .recent_log
        .iter()
        .any(|entry| entry.message == "Screen recording ended - User stopped sharing"));
}

#[tokio::test(start_paused = true)]
async fn restart_after_end_begins_a_fresh_session() {
    let h = harness(denied());
    h.controller.start().await.expect("start");
    h.controller
        .handle_input(InputEvent::Visibility { hidden: true })
        .await;
    h.controller.end().await.expect("summary");

    assert_eq!(h.controller.start().await.expect("restart"), SessionStatus::Active);
    let view = h.controller.snapshot().await;
    assert_eq!(view.counters.total(), 0);
    assert!(h.controller.summary().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn foreign_screen_capture_is_counted() {
    let h = harness(SimulatedMediaConfig {
        camera: SimulatedGrant::Deny,
        ..SimulatedMediaConfig::default()
    });
    h.controller.start().await.expect("start");
    assert!(h.media.screen_owned());

    assert!(h.media.acquire_screen().await.is_err());
    tokio::time::sleep(Duration::from_millis(10)).await;

    let view = h.controller.snapshot().await;
    assert_eq!(view.counters.screenshot_attempts, 1);
    assert!(view.recent_log.iter().any(|entry| {
        entry.category == LogCategory::Warning
            && entry.message == "Unauthorized screen capture attempt detected"
    }));
    assert!(view
        .prompt
        .is_some_and(|prompt| prompt.message.starts_with("Unauthorized screen recording attempt")));
    assert_eq!(h.media.inner().live_streams(), 1);
}

#[tokio::test(start_paused = true)]
async fn every_pointer_move_is_presented() {
    let h = harness(denied());
    h.controller.start().await.expect("start");
    let logged = h.controller.snapshot().await.recent_log.len();
    let presented = h.presenter.count();

    let viewport = Viewport::new(1280.0, 720.0);
    for x in [100.0, 106.0] {
        h.controller
            .handle_pointer(PointerEvent::Move { x, y: 100.0, viewport })
            .await;
    }

    assert!(h.presenter.count() >= presented + 2);
    let view = h.presenter.last().expect("presented");
    assert_eq!(view.mouse.total_distance, 6.0);
    assert_eq!(view.recent_log.len(), logged);
}

/// Camera works, but the screen-share picker never answers.
struct StalledScreen {
    inner: SimulatedCapture,
}

#[async_trait]
impl MediaCapture for StalledScreen {
    async fn acquire_camera(&self) -> Result<MediaStream, ProctorError> {
        self.inner.acquire_camera().await
    }

    async fn acquire_screen(&self) -> Result<MediaStream, ProctorError> {
        std::future::pending().await
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
        self.inner.release(stream)
    }
}

#[tokio::test(start_paused = true)]
async fn abandoned_start_releases_the_camera_and_can_be_retried() {
    let media = Arc::new(StalledScreen {
        inner: SimulatedCapture::granting(),
    });
    let controller = SessionController::new(
        MonitorConfig::default(),
        false,
        media.clone(),
        Arc::new(SimulatedFullscreen::new(true)),
        Arc::new(CollectingPresenter::default()),
    );

    let attempt = tokio::time::timeout(Duration::from_secs(60), controller.start()).await;
    assert!(attempt.is_err());

    assert_eq!(controller.status().await, SessionStatus::NotStarted);
    assert_eq!(media.inner.live_streams(), 0);
    assert!(controller.end().await.is_none());
    assert!(!controller.tickers_running());

    // The retry gets past the lifecycle check and stalls on the picker again.
    let retry = tokio::time::timeout(Duration::from_secs(1), controller.start()).await;
    assert!(retry.is_err());
    assert_eq!(controller.status().await, SessionStatus::NotStarted);
    assert_eq!(media.inner.live_streams(), 0);
}
