// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Domain-specific error types
#[derive(Error, Debug)]
pub enum DomainError {
    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// External executable could not be located
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    /// Source duration could not be determined
    #[error("Could not determine duration of {path}: {reason}")]
    DurationUnavailable { path: String, reason: String },

    /// Time string is not in H:MM:SS, MM:SS or SS form
    #[error("Invalid time format: '{0}'. Expected H:MM:SS, MM:SS or SS")]
    MalformedTime(String),

    /// Time range does not fit the source or is inverted
    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    /// External tool exited with a non-zero status
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    ToolExecutionFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// External tool exceeded its time budget
    #[error("{tool} timed out after {seconds}s")]
    TimedOut { tool: String, seconds: u64 },

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DomainError {
    /// Errors that make every following clip fail the same way
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(self, DomainError::ToolNotFound(_))
    }
}
