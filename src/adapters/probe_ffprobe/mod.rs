//! FFprobe adapter for media duration probing
//!
//! The first video stream's duration is preferred; containers that do not
//! report a stream duration fall back to the format-level duration.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::DiagnosticExtractor;
use crate::ports::*;

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    runner: Arc<dyn CommandPort>,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter on top of a command runner
    pub fn new(runner: Arc<dyn CommandPort>) -> Self {
        Self { runner }
    }

    /// Arguments querying a single duration entry
    pub fn duration_args(file_path: &Path, entries: &str, stream: Option<&str>) -> Vec<String> {
        let mut args = vec!["-v".to_string(), "error".to_string()];
        if let Some(selector) = stream {
            args.push("-select_streams".to_string());
            args.push(selector.to_string());
        }
        args.extend(
            [
                "-show_entries",
                entries,
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ]
            .map(String::from),
        );
        args.push(file_path.to_string_lossy().into_owned());
        args
    }

    /// First line of ffprobe output that is a usable duration
    pub fn parse_duration(stdout: &str) -> Option<f64> {
        stdout
            .lines()
            .map(str::trim)
            .filter_map(|line| line.parse::<f64>().ok())
            .find(|value| value.is_finite() && *value >= 0.0)
    }

    async fn query(
        &self,
        file_path: &Path,
        entries: &str,
        stream: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Result<f64, String>, DomainError> {
        let args = Self::duration_args(file_path, entries, stream);
        let outcome = self.runner.run(&args, ToolKind::Prober, None, cancel).await?;
        Ok(match outcome {
            RunOutcome::Exited(output) if output.success() => Self::parse_duration(&output.stdout)
                .ok_or_else(|| format!("no usable {} in ffprobe output", entries)),
            RunOutcome::Exited(output) => {
                Err(DiagnosticExtractor::failure_reason(ToolKind::Prober, &output))
            }
            RunOutcome::TimedOut => Err("ffprobe timed out".to_string()),
            RunOutcome::Cancelled => Err(STOPPED_BY_USER.to_string()),
        })
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe_duration(
        &self,
        file_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<f64, DomainError> {
        let unavailable = |reason: String| DomainError::DurationUnavailable {
            path: file_path.display().to_string(),
            reason,
        };

        if !file_path.is_file() {
            return Err(unavailable("file does not exist".to_string()));
        }

        match self
            .query(file_path, "stream=duration", Some("v:0"), cancel)
            .await?
        {
            Ok(duration) => {
                debug!("Video stream duration of {}: {}s", file_path.display(), duration);
                return Ok(duration);
            }
            Err(reason) => debug!(
                "Stream duration unavailable for {} ({}), trying container",
                file_path.display(),
                reason
            ),
        }

        let duration = self
            .query(file_path, "format=duration", None, cancel)
            .await?
            .map_err(unavailable)?;
        debug!("Container duration of {}: {}s", file_path.display(), duration);
        Ok(duration)
    }
}
