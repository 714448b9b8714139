use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// Inner size of the page at the moment a pointer event was sampled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Pointer events routed to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerEvent {
    Move { x: f64, y: f64, viewport: Viewport },
    Leave,
    Enter,
}

/// Something the tracker wants reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseSignal {
    Jump { distance: f64 },
    IdleWarning { idle_secs: u64 },
    IdleTimeout,
    Resumed { idle_ms: u64 },
    LeftViewport,
    ReturnedToViewport { away_ms: u64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseSummary {
    pub total_distance: f64,
    pub coverage_percent: f64,
    pub exit_count: u32,
    pub exit_seconds: f64,
    pub jump_count: u32,
    pub idle_seconds: f64,
    pub currently_idle: bool,
}
