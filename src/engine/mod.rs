//! Clip engine: command construction, encoder fallback and progress

pub mod hwaccel;
pub mod normalize;
pub mod progress;

pub use hwaccel::run_with_fallback;
pub use normalize::{EncodeCommand, EncodeInput};
pub use progress::{
    ConsoleProgressSink, JsonProgressSink, NoOpProgressSink, ProgressSnapshot, ProgressTracker,
};
