pub mod tracker;
pub mod types;

pub use tracker::{MouseActivityTracker, MouseState};
pub use types::{MouseSignal, MouseSummary, Point, PointerEvent, Viewport};
