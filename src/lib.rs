//! bulkclip library
//!
//! Cuts a list of time ranges out of one source video and optionally brackets
//! every clip with an intro and an outro. All media work is delegated to the
//! ffmpeg and ffprobe executables; this crate orchestrates them, normalizes
//! segments so they can be concatenated, falls back from hardware to
//! software encoding, and reports progress.
//!
//! The layout is hexagonal: `domain` holds pure types and rules, `ports`
//! the traits the use cases depend on, `adapters` the process and file
//! backed implementations, `engine` command construction, and `app` the
//! interactors wiring it all together.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{
    BatchReport, BatchStatus, ClipOutcome, ClipRequest, EncoderId, FailurePolicy, TimeRange,
    TimeSpec,
};
