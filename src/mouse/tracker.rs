use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use crate::config::MonitorConfig;

use super::types::{MouseSignal, MouseSummary, Point, Viewport};

#[derive(Debug, Clone)]
pub struct MouseState {
    pub last_position: Option<Point>,
    pub total_distance: f64,
    pub visited_cells: HashSet<(i64, i64)>,
    /// Highest coverage seen so far; a later, larger viewport never lowers it.
    pub coverage_percent: f64,
    pub history: VecDeque<Point>,
    pub jump_count: u32,

    pub last_activity: Instant,
    pub idle: bool,
    pub idle_started: Option<Instant>,
    pub idle_accumulated_ms: u64,
    pub idle_warned: bool,

    pub exit_count: u32,
    pub exit_duration_ms: u64,
    pub left_at: Option<Instant>,
}

impl MouseState {
    fn new(now: Instant) -> Self {
        Self {
            last_position: None,
            total_distance: 0.0,
            visited_cells: HashSet::new(),
            coverage_percent: 0.0,
            history: VecDeque::new(),
            jump_count: 0,
            last_activity: now,
            idle: false,
            idle_started: None,
            idle_accumulated_ms: 0,
            idle_warned: false,
            exit_count: 0,
            exit_duration_ms: 0,
            left_at: None,
        }
    }
}

/// Derives distance, coverage, jump, idle and viewport-exit signals from pointer activity.
#[derive(Debug, Clone)]
pub struct MouseActivityTracker {
    jump_threshold: f64,
    grid_size: f64,
    history_len: usize,
    idle_warning: Duration,
    idle_timeout: Duration,
    state: MouseState,
}

impl MouseActivityTracker {
    pub fn new(config: &MonitorConfig, now: Instant) -> Self {
        Self {
            jump_threshold: config.jump_threshold,
            grid_size: config.grid_size.max(1.0),
            history_len: config.movement_history_len,
            idle_warning: config.idle_warning(),
            idle_timeout: config.idle_timeout(),
            state: MouseState::new(now),
        }
    }

    pub fn state(&self) -> &MouseState {
        &self.state
    }

    pub fn reset(&mut self, now: Instant) {
        self.state = MouseState::new(now);
    }

    pub fn on_move(&mut self, position: Point, viewport: Viewport, now: Instant) -> Vec<MouseSignal> {
        let mut signals = Vec::new();
        if let Some(resumed) = self.mark_activity(now) {
            signals.push(resumed);
        }

        if let Some(previous) = self.state.last_position {
            let distance = previous.distance_to(&position);
            self.state.total_distance += distance;
            if distance > self.jump_threshold {
                self.state.jump_count += 1;
                signals.push(MouseSignal::Jump { distance });
            }
        }

        self.state.last_position = Some(position);
        self.state.history.push_back(position);
        while self.state.history.len() > self.history_len {
            self.state.history.pop_front();
        }

        self.record_coverage(position, viewport);
        signals
    }

    /// Runs once per idle tick.
    pub fn on_tick(&mut self, now: Instant) -> Vec<MouseSignal> {
        let mut signals = Vec::new();
        let idle_for = now.saturating_duration_since(self.state.last_activity);

        if idle_for > self.idle_warning && !self.state.idle && !self.state.idle_warned {
            self.state.idle_warned = true;
            signals.push(MouseSignal::IdleWarning {
                idle_secs: self.idle_warning.as_secs(),
            });
        }

        if idle_for > self.idle_timeout && !self.state.idle {
            self.state.idle = true;
            self.state.idle_started = Some(now);
            signals.push(MouseSignal::IdleTimeout);
        }

        signals
    }

    pub fn on_leave(&mut self, now: Instant) -> Option<MouseSignal> {
        if self.state.left_at.is_some() {
            return None;
        }
        self.state.exit_count += 1;
        self.state.left_at = Some(now);
        Some(MouseSignal::LeftViewport)
    }

    pub fn on_enter(&mut self, now: Instant) -> Option<MouseSignal> {
        let left_at = self.state.left_at.take()?;
        let away_ms = duration_ms(now.saturating_duration_since(left_at));
        self.state.exit_duration_ms += away_ms;
        Some(MouseSignal::ReturnedToViewport { away_ms })
    }

    /// Closes any open idle or exit interval when the session ends.
    pub fn finish(&mut self, now: Instant) {
        if self.state.idle {
            if let Some(started) = self.state.idle_started.take() {
                self.state.idle_accumulated_ms += duration_ms(now.saturating_duration_since(started));
            }
            self.state.idle = false;
        }
        if let Some(left_at) = self.state.left_at.take() {
            self.state.exit_duration_ms += duration_ms(now.saturating_duration_since(left_at));
        }
    }

    pub fn summary(&self) -> MouseSummary {
        MouseSummary {
            total_distance: self.state.total_distance,
            coverage_percent: self.state.coverage_percent,
            exit_count: self.state.exit_count,
            exit_seconds: self.state.exit_duration_ms as f64 / 1000.0,
            jump_count: self.state.jump_count,
            idle_seconds: self.state.idle_accumulated_ms as f64 / 1000.0,
            currently_idle: self.state.idle,
        }
    }

    fn mark_activity(&mut self, now: Instant) -> Option<MouseSignal> {
        self.state.last_activity = now;
        self.state.idle_warned = false;

        if !self.state.idle {
            return None;
        }
        self.state.idle = false;
        let started = self.state.idle_started.take()?;
        let idle_ms = duration_ms(now.saturating_duration_since(started));
        self.state.idle_accumulated_ms += idle_ms;
        Some(MouseSignal::Resumed { idle_ms })
    }

    fn record_coverage(&mut self, position: Point, viewport: Viewport) {
        let columns = (viewport.width / self.grid_size).ceil() as i64;
        let rows = (viewport.height / self.grid_size).ceil() as i64;
        if columns <= 0 || rows <= 0 {
            return;
        }

        let cell = (
            (position.x / self.grid_size).floor() as i64,
            (position.y / self.grid_size).floor() as i64,
        );
        if cell.0 < 0 || cell.1 < 0 || cell.0 >= columns || cell.1 >= rows {
            return;
        }
        if !self.state.visited_cells.insert(cell) {
            return;
        }

        let total_cells = columns as f64 * rows as f64;
        let percent = (self.state.visited_cells.len() as f64 / total_cells * 100.0).min(100.0);
        self.state.coverage_percent = self.state.coverage_percent.max(percent);
    }
}

fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}
