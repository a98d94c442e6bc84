// Domain rules - Business logic and policies

use crate::domain::errors::*;
use crate::domain::model::*;

/// Clip progress once the main segment is cut
pub const PROGRESS_CUT_DONE: u8 = 33;

/// Clip progress once intro/outro normalization is finished
pub const PROGRESS_NORMALIZE_DONE: u8 = 66;

/// Clip progress once the output file is written
pub const PROGRESS_CLIP_DONE: u8 = 100;

/// Business rules for time range validation
pub struct RangeValidator;

impl RangeValidator {
    /// Pure predicate: does [start, end) fit a source of `duration` seconds
    pub fn validate(start: f64, end: f64, duration: f64) -> bool {
        (0.0..duration).contains(&start) && end > 0.0 && end <= duration && start < end
    }

    /// Check a parsed range against a probed duration
    pub fn check(range: &TimeRange, duration: f64) -> Result<(), DomainError> {
        if Self::validate(range.start.as_seconds(), range.end.as_seconds(), duration) {
            Ok(())
        } else {
            Err(DomainError::InvalidRange(format!(
                "{} does not fit within the source duration of {:.2}s",
                range, duration
            )))
        }
    }
}

/// Business rules for batch-level progress
pub struct ProgressCalculator;

impl ProgressCalculator {
    /// Map a clip's stage percentage onto the whole batch.
    ///
    /// `clip_index` is 1-based; clip `i` of `n` covers
    /// `[(i-1)*100/n, i*100/n]`.
    pub fn overall(clip_index: usize, total_clips: usize, stage_percent: u8) -> f64 {
        if total_clips == 0 || clip_index == 0 {
            return 0.0;
        }
        let completed = (clip_index - 1) as f64 * 100.0;
        ((completed + f64::from(stage_percent.min(100))) / total_clips as f64).min(100.0)
    }
}

/// Business rules for turning tool diagnostics into a user-facing cause
pub struct DiagnosticExtractor;

impl DiagnosticExtractor {
    /// Last stderr line mentioning "error", case-insensitively
    pub fn best_error_line(stderr: &str) -> Option<String> {
        stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| line.to_lowercase().contains("error"))
            .map(str::to_string)
    }

    /// Cause reported for a failed invocation
    pub fn failure_reason(tool: ToolKind, output: &ProcessOutput) -> String {
        Self::best_error_line(&output.stderr).unwrap_or_else(|| {
            format!(
                "{} exited with code {} without reporting an error",
                tool, output.exit_code
            )
        })
    }
}
