use std::time::Instant;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use crate::activity_log::ActivityLog;
use crate::config::MonitorConfig;
use crate::error::{Capability, ProctorError};
use crate::fullscreen::{FullscreenGuard, FullscreenSignal, REENTRY_PROMPT};
use crate::language::Language;
use crate::media::{MediaState, MediaStream, RecorderHandle, Snapshot, StreamKind};
use crate::mouse::{MouseActivityTracker, MouseSignal, PointerEvent, Point};
use crate::summary::SessionSummary;
use crate::violations::{CounterKind, InputEvent, Verdict, ViolationClassifier, ViolationCounters};

use super::permissions::{grant_notice, request_notice, CaptureGrant, PermissionNotice};
use super::state::{SessionState, SessionStatus};
use super::view::{Prompt, PromptAction, ViewModel};

const START_PROMPT: &str =
    "Test is starting! Click \"I Understand\" to enter fullscreen mode and begin monitoring.";
const FULLSCREEN_FALLBACK_PROMPT: &str =
    "Unable to enter fullscreen mode automatically. Please press F11 to enter fullscreen manually.";
const IDLE_PROMPT: &str =
    "Extended inactivity detected! This may indicate the user has left the test area.";
const SCREEN_STOPPED_PROMPT: &str = "Screen recording stopped! This is considered a violation.";

/// Platform handles owned by the session while it runs.
#[derive(Debug, Default)]
pub struct MediaHandles {
    pub camera: Option<MediaStream>,
    pub screen: Option<MediaStream>,
    pub recorder: Option<RecorderHandle>,
}

/// Encoded screen recording collected when the session ended.
#[derive(Debug, Clone)]
pub struct Recording {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Recording {
    pub fn new(ended_at: DateTime<Utc>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("test-recording-{}.webm", ended_at.format("%Y-%m-%dT%H:%M:%S")),
            bytes,
        }
    }
}

/// Synchronous session core.
///
/// Owns every piece of per-session state and turns platform events into
/// counter updates, log entries and prompts. It never touches the platform
/// itself; the controller performs capture and fullscreen calls around it
/// and reports the outcome back.
#[derive(Debug)]
pub struct ProctorSession {
    config: MonitorConfig,
    state: SessionState,
    counters: ViolationCounters,
    log: ActivityLog,
    classifier: ViolationClassifier,
    mouse: MouseActivityTracker,
    fullscreen: FullscreenGuard,
    media: MediaState,
    handles: MediaHandles,
    prompt: Option<Prompt>,
    snapshots: Vec<Snapshot>,
    recording: Option<Recording>,
    summary: Option<SessionSummary>,
    language: Language,
}

impl ProctorSession {
    pub fn new(config: MonitorConfig, verbose: bool, now: Instant) -> Self {
        Self {
            classifier: ViolationClassifier::new(verbose, config.large_selection_chars),
            mouse: MouseActivityTracker::new(&config, now),
            log: ActivityLog::new(config.display_log_entries),
            config,
            state: SessionState::new(),
            counters: ViolationCounters::default(),
            fullscreen: FullscreenGuard::new(),
            media: MediaState::default(),
            handles: MediaHandles::default(),
            prompt: None,
            snapshots: Vec::new(),
            recording: None,
            summary: None,
            language: Language::default(),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn counters(&self) -> &ViolationCounters {
        &self.counters
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn media(&self) -> &MediaState {
        &self.media
    }

    pub fn mouse(&self) -> &MouseActivityTracker {
        &self.mouse
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn recording(&self) -> Option<&Recording> {
        self.recording.as_ref()
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.classifier.set_verbose(verbose);
    }

    pub fn is_fullscreen_compliant(&self) -> bool {
        self.fullscreen.is_compliant()
    }

    // ---- lifecycle ----

    /// Leave NotStarted or Ended and wait for permissions. A previous
    /// session's results are discarded.
    pub fn begin(&mut self, session_id: String) -> Result<()> {
        if !self.state.can_start() {
            bail!(
                "cannot start a session while it is {}",
                self.state.status.as_str().to_lowercase()
            );
        }

        self.state.request_start(session_id);
        self.log.clear();
        self.counters.reset();
        self.media = MediaState::default();
        self.handles = MediaHandles::default();
        self.prompt = None;
        self.snapshots.clear();
        self.recording = None;
        self.summary = None;
        Ok(())
    }

    pub fn permission_requested(&mut self, capability: Capability) {
        self.apply_notice(request_notice(capability));
    }

    /// Record the answer to a capture request and keep any granted stream.
    pub fn permission_resolved(&mut self, capability: Capability, grant: CaptureGrant) {
        self.apply_notice(grant_notice(capability, &grant));
        let CaptureGrant::Granted(stream) = grant else {
            return;
        };
        match stream.kind {
            StreamKind::Camera => {
                self.media.webcam_active = true;
                self.handles.camera = Some(stream);
            }
            StreamKind::Screen => {
                self.media.screen_recording = true;
                self.handles.screen = Some(stream);
            }
        }
    }

    /// Finish negotiation and start monitoring. Returns false when the
    /// session is no longer waiting for permissions.
    pub fn activate(&mut self, started_at: DateTime<Utc>, now: Instant, is_fullscreen: bool) -> bool {
        if self.state.status != SessionStatus::AwaitingPermissions {
            return false;
        }

        self.state.activate(started_at, now);
        self.counters.reset();
        self.media.snapshot_count = 0;
        self.snapshots.clear();
        self.classifier.reset();
        self.mouse.reset(now);
        self.fullscreen.arm(is_fullscreen);

        self.log.info("Mouse tracking initialized");
        if self.media.webcam_active {
            self.log.info(format!(
                "Starting webcam monitoring - snapshots every {} seconds",
                self.config.snapshot_interval().as_secs()
            ));
        }
        self.log.info("Test started - Attempting to enter fullscreen mode");
        self.prompt = Some(Prompt::with_action(START_PROMPT, PromptAction::ReenterFullscreen));
        true
    }

    /// Roll back a start whose negotiation never finished. Returns the
    /// streams acquired so far, or `None` when no negotiation was pending.
    pub fn abandon_start(&mut self) -> Option<MediaHandles> {
        if self.state.status != SessionStatus::AwaitingPermissions {
            return None;
        }

        self.state = SessionState::new();
        self.media = MediaState::default();
        self.prompt = None;
        self.log.warn("Permission negotiation abandoned - Session not started");
        Some(std::mem::take(&mut self.handles))
    }

    pub fn camera_stream(&self) -> Option<&MediaStream> {
        self.handles.camera.as_ref()
    }

    pub fn screen_stream(&self) -> Option<&MediaStream> {
        self.handles.screen.as_ref()
    }

    pub fn recording_started(&mut self, handle: RecorderHandle) {
        self.handles.recorder = Some(handle);
        self.log.info("Screen recording started");
    }

    /// The recorder could not start; screen monitoring degrades and the
    /// stream is handed back for release.
    pub fn recording_failed(&mut self, err: &ProctorError) -> Option<MediaStream> {
        self.log.warn(format!("Failed to start screen recording: {err}"));
        self.media.screen_recording = false;
        self.handles.screen.take()
    }

    /// Stop monitoring. Returns the handles the caller must stop and release,
    /// or `None` when the session was not active.
    pub fn finish(&mut self, ended_at: DateTime<Utc>, now: Instant) -> Option<MediaHandles> {
        if !self.state.is_active() {
            return None;
        }

        self.state.end(ended_at, now);
        self.mouse.finish(now);
        self.fullscreen.disarm();
        self.media.webcam_active = false;
        self.media.screen_recording = false;
        self.log.info("Mouse tracking stopped");
        self.log.info("Test ended - Stopping all monitoring");
        Some(std::mem::take(&mut self.handles))
    }

    /// Build the summary once capture has been torn down.
    pub fn conclude(&mut self, recording: Option<Recording>) -> SessionSummary {
        if recording.is_some() {
            self.log.info("Screen recording saved");
        }
        let summary = SessionSummary::build(
            self.state.elapsed_ms,
            &self.counters,
            &self.media,
            &self.mouse.summary(),
            recording.is_some(),
        );
        self.recording = recording;
        self.prompt = Some(Prompt::notice(summary.to_string()));
        self.summary = Some(summary.clone());
        summary
    }

    // ---- events ----

    pub fn handle_input(&mut self, event: &InputEvent) -> Verdict {
        let verdict = self.classifier.classify(event, self.state.is_active());

        if let Some(classification) = &verdict.classification {
            if let Some(counter) = classification.counter() {
                self.counters.increment(counter);
            }
            self.log.push(classification.level, classification.message.clone());
            if let Some(warning) = &classification.warning {
                self.prompt = Some(Prompt::notice(warning.clone()));
            }
        }
        if let Some(debug) = &verdict.debug {
            self.log.debug(debug.clone());
        }

        verdict
    }

    /// Feed a pointer event to the tracker. Returns false when no session
    /// is active and the event was dropped.
    pub fn handle_pointer(&mut self, event: &PointerEvent, now: Instant) -> bool {
        if !self.state.is_active() {
            return false;
        }
        let signals = match *event {
            PointerEvent::Move { x, y, viewport } => {
                self.mouse.on_move(Point::new(x, y), viewport, now)
            }
            PointerEvent::Leave => self.mouse.on_leave(now).into_iter().collect(),
            PointerEvent::Enter => self.mouse.on_enter(now).into_iter().collect(),
        };
        self.apply_mouse_signals(signals);
        true
    }

    /// Idle check, run once per tick.
    pub fn idle_tick(&mut self, now: Instant) {
        if !self.state.is_active() {
            return;
        }
        let signals = self.mouse.on_tick(now);
        self.apply_mouse_signals(signals);
    }

    /// A fullscreen change event fired.
    pub fn fullscreen_changed(&mut self, is_fullscreen: bool) {
        if let Some(FullscreenSignal::Exited) = self.fullscreen.on_change(is_fullscreen) {
            self.log.warn("Fullscreen mode exited - Violation detected");
            self.prompt = Some(Prompt::with_action(
                REENTRY_PROMPT,
                PromptAction::ReenterFullscreen,
            ));
        }
    }

    pub fn refresh_fullscreen(&mut self, is_fullscreen: bool) {
        self.fullscreen.refresh(is_fullscreen);
    }

    pub fn fullscreen_result(&mut self, result: Result<(), ProctorError>, is_fullscreen: bool) {
        match result {
            Ok(()) => {
                self.log.info("Successfully entered fullscreen mode");
                self.fullscreen.refresh(is_fullscreen);
            }
            Err(err) => {
                self.log.warn(format!("Failed to enter fullscreen mode - {err}"));
                self.prompt = Some(Prompt::notice(FULLSCREEN_FALLBACK_PROMPT));
            }
        }
    }

    /// Hide the prompt and hand back the action its acknowledgement triggers.
    pub fn acknowledge(&mut self) -> Option<PromptAction> {
        self.prompt.take().and_then(|prompt| prompt.action)
    }

    pub fn record_snapshot(&mut self, snapshot: Snapshot) -> bool {
        if !self.state.is_active() || !self.media.webcam_active {
            return false;
        }
        self.snapshots.push(snapshot);
        self.media.snapshot_count += 1;
        self.log.info(format!("Webcam snapshot {} taken", self.media.snapshot_count));
        true
    }

    /// A capture track stopped outside of our control.
    pub fn track_ended(&mut self, kind: StreamKind) {
        match kind {
            StreamKind::Screen => {
                if !self.media.screen_recording {
                    return;
                }
                self.media.screen_recording = false;
                self.log.warn("Screen recording ended - User stopped sharing");
                if self.state.is_active() {
                    self.prompt = Some(Prompt::notice(SCREEN_STOPPED_PROMPT));
                }
            }
            StreamKind::Camera => {
                if !self.media.webcam_active {
                    return;
                }
                self.media.webcam_active = false;
                self.log.warn("Webcam stream ended");
            }
        }
    }

    pub fn change_language(&mut self, language: Language) -> &'static str {
        self.language = language;
        self.log.info(format!("Language changed to {language}"));
        language.starter_template()
    }

    pub fn view_model(&self, now: Instant) -> ViewModel {
        ViewModel {
            state: self.state.status,
            session_id: self.state.session_id.clone(),
            elapsed: self.state.clock(now),
            counters: self.counters,
            recent_log: self.log.recent().to_vec(),
            mouse: self.mouse.summary(),
            media: self.media,
            fullscreen_compliant: self.is_fullscreen_compliant(),
            prompt: self.prompt.clone(),
        }
    }

    fn apply_notice(&mut self, notice: PermissionNotice) {
        self.log.push(notice.level, notice.message);
        if let Some(prompt) = notice.prompt {
            self.prompt = Some(Prompt::notice(prompt));
        }
    }

    fn apply_mouse_signals(&mut self, signals: Vec<MouseSignal>) {
        for signal in signals {
            match signal {
                MouseSignal::Jump { distance } => {
                    self.counters.increment(CounterKind::MouseJumps);
                    self.log.warn(format!("Large mouse jump detected: {distance:.0} pixels"));
                }
                MouseSignal::IdleWarning { idle_secs } => {
                    self.log.warn(format!("Mouse inactivity warning - {idle_secs} seconds idle"));
                }
                MouseSignal::IdleTimeout => {
                    self.counters.increment(CounterKind::IdleEvents);
                    self.log.warn("Mouse idle timeout reached - User appears inactive");
                    self.prompt = Some(Prompt::notice(IDLE_PROMPT));
                }
                MouseSignal::Resumed { idle_ms } => {
                    self.log.info(format!(
                        "User returned from idle state after {:.1} seconds",
                        idle_ms as f64 / 1000.0
                    ));
                }
                MouseSignal::LeftViewport => {
                    self.log.warn("Mouse left browser window");
                }
                MouseSignal::ReturnedToViewport { away_ms } => {
                    self.log.info(format!(
                        "Mouse returned to browser after {:.1}s",
                        away_ms as f64 / 1000.0
                    ));
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn push_log(&mut self, category: crate::activity_log::LogCategory, message: &str) {
        self.log.push(category, message);
    }
}
