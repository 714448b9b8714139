pub mod controller;
pub mod monitor;
pub mod permissions;
pub mod state;
pub mod tickers;
pub mod view;

pub use controller::SessionController;
pub use monitor::{MediaHandles, ProctorSession, Recording};
pub use permissions::{CaptureGrant, PermissionNegotiator};
pub use state::{SessionState, SessionStatus};
pub use view::{Presenter, Prompt, PromptAction, ViewModel};

/// Monotonic now, read through tokio's clock so paused test time applies.
pub(crate) fn monotonic_now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}
