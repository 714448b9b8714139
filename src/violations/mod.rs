pub mod classifier;
pub mod counters;
pub mod input;

pub use classifier::{Classification, Verdict, ViolationCategory, ViolationClassifier};
pub use counters::{CounterKind, ViolationCounters};
pub use input::{ClipboardAction, InputEvent, KeyEvent, KeyPhase, Modifiers};
