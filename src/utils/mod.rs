//! Common utilities and helpers

pub mod path;
pub mod time;

pub use path::PathUtils;
pub use time::{format_duration, format_seconds_precise};
