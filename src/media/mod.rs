pub mod adapter;
pub mod exclusive;
pub mod simulated;
pub mod snapshot;

pub use adapter::{MediaCapture, MediaState, MediaStream, RecorderHandle, StreamKind};
pub use exclusive::{ExclusiveCapture, ForeignCaptureAttempt};
pub use simulated::{SimulatedCapture, SimulatedGrant, SimulatedMediaConfig};
pub use snapshot::{encode_snapshot, Snapshot};
