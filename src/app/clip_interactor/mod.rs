// Clip interactor - Runs the segment pipeline for one clip

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::engine::hwaccel::run_with_fallback;
use crate::engine::normalize::{write_manifest, EncodeCommand};
use crate::ports::*;
use crate::utils::PathUtils;

/// Prefix of every per-clip scratch directory
pub const SCRATCH_PREFIX: &str = "bulkclip-";

/// Knobs shared by every clip of a run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Master switch for hardware encoding
    pub hw_acceleration: bool,
    /// Budget for the final concatenation
    pub concat_timeout: Option<Duration>,
    /// Parent of the scratch directories, system temp dir when unset
    pub scratch_root: Option<PathBuf>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            hw_acceleration: true,
            concat_timeout: Some(Duration::from_secs(600)),
            scratch_root: None,
        }
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRun {
    pub outcome: ClipOutcome,
    /// Whether every later clip would fail the same way
    pub fatal: bool,
}

impl ClipRun {
    pub fn from_outcome(outcome: ClipOutcome) -> Self {
        Self {
            outcome,
            fatal: false,
        }
    }

    pub fn from_error(error: &DomainError) -> Self {
        Self {
            outcome: ClipOutcome::Failed {
                reason: error.to_string(),
            },
            fatal: error.is_fatal_for_batch(),
        }
    }
}

/// Stage progress callback, receives 33, 66 and 100
pub type StageProgress<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Unwrap a stage result or return the matching terminal outcome.
///
/// A failure observed after cancellation was requested is reported as a
/// cancellation.
macro_rules! stage {
    ($cancel:expr, $stage:expr, $result:expr) => {
        match $result? {
            StageOutcome::Ok(value) => value,
            StageOutcome::Failed(reason) if $cancel.is_cancelled() => {
                info!(stage = %$stage, "Stage ended after cancellation: {}", reason);
                return Ok(ClipOutcome::Cancelled);
            }
            StageOutcome::Failed(reason) => {
                warn!(stage = %$stage, "Stage failed: {}", reason);
                return Ok(ClipOutcome::Failed { reason });
            }
            StageOutcome::TimedOut => {
                warn!(stage = %$stage, "Stage timed out");
                return Ok(ClipOutcome::Cancelled);
            }
            StageOutcome::Cancelled => {
                info!(stage = %$stage, "Stage cancelled");
                return Ok(ClipOutcome::Cancelled);
            }
        }
    };
}

/// Bail out between stages once cancellation was requested
macro_rules! checkpoint {
    ($cancel:expr, $stage:expr) => {
        if $cancel.is_cancelled() {
            info!(stage = %$stage, "Cancelled before stage");
            return Ok(ClipOutcome::Cancelled);
        }
    };
}

/// Interactor for the per-clip segment pipeline
pub struct ClipInteractor {
    runner: Arc<dyn CommandPort>,
    catalog: Arc<dyn EncoderCatalogPort>,
    settings: PipelineSettings,
}

impl ClipInteractor {
    /// Create new clip interactor with injected ports
    pub fn new(
        runner: Arc<dyn CommandPort>,
        catalog: Arc<dyn EncoderCatalogPort>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            runner,
            catalog,
            settings,
        }
    }

    /// Whether the requested encoder may be used at all
    fn hardware_enabled(&self, encoder: Option<EncoderId>) -> bool {
        match encoder {
            Some(id) if self.settings.hw_acceleration => {
                let available = self.catalog.is_available(id);
                if !available {
                    info!("{} is not in the encoder catalog", id.display_name());
                }
                available
            }
            _ => false,
        }
    }

    fn create_scratch(&self) -> Result<TempDir, DomainError> {
        let root = self
            .settings
            .scratch_root
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&root)?;
        debug!("Created scratch directory {}", dir.path().display());
        Ok(dir)
    }

    /// Produce one clip.
    ///
    /// Never returns an error: every failure is folded into the outcome and
    /// the scratch directory is removed on every path.
    pub async fn execute(
        &self,
        request: &ClipRequest,
        cancel: &CancellationToken,
        on_stage: StageProgress<'_>,
    ) -> ClipRun {
        info!(
            "Clipping {} [{}] -> {}",
            request.source.display(),
            request.range,
            request.output_path.display()
        );

        let scratch = match self.create_scratch() {
            Ok(dir) => dir,
            Err(e) => return ClipRun::from_error(&e),
        };

        let result = AssertUnwindSafe(self.run_stages(request, scratch.path(), cancel, on_stage))
            .catch_unwind()
            .await;

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!(
                "Failed to remove scratch directory {}: {}",
                scratch_path.display(),
                e
            );
        }

        match result {
            Ok(Ok(outcome)) => ClipRun::from_outcome(outcome),
            Ok(Err(e)) => ClipRun::from_error(&e),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Clip pipeline panicked: {}", message);
                ClipRun::from_outcome(ClipOutcome::Failed {
                    reason: format!("internal error: {}", message),
                })
            }
        }
    }

    async fn run_stages(
        &self,
        request: &ClipRequest,
        scratch: &Path,
        cancel: &CancellationToken,
        on_stage: StageProgress<'_>,
    ) -> Result<ClipOutcome, DomainError> {
        let profile = EncodeProfile::for_encoder(request.hw_encoder, request.lossless);
        let hardware = self.hardware_enabled(request.hw_encoder);
        let runner = self.runner.as_ref();

        checkpoint!(cancel, PipelineStage::CutMain);
        let main_part = scratch.join("main.mp4");
        let cut = EncodeCommand::cut(&request.source, request.range, profile.clone(), &main_part);
        stage!(
            cancel,
            PipelineStage::CutMain,
            run_with_fallback(runner, &cut, hardware, None, cancel).await
        );
        on_stage(PROGRESS_CUT_DONE);

        let mut parts: Vec<PathBuf> = Vec::with_capacity(3);
        if let Some(intro) = &request.intro {
            checkpoint!(cancel, PipelineStage::NormalizeIntro);
            let normalized = scratch.join("intro.mp4");
            let command = EncodeCommand::normalize(intro, profile.clone(), &normalized);
            stage!(
                cancel,
                PipelineStage::NormalizeIntro,
                run_with_fallback(runner, &command, hardware, None, cancel).await
            );
            parts.push(normalized);
        }
        parts.push(main_part.clone());
        if let Some(outro) = &request.outro {
            checkpoint!(cancel, PipelineStage::NormalizeOutro);
            let normalized = scratch.join("outro.mp4");
            let command = EncodeCommand::normalize(outro, profile.clone(), &normalized);
            stage!(
                cancel,
                PipelineStage::NormalizeOutro,
                run_with_fallback(runner, &command, hardware, None, cancel).await
            );
            parts.push(normalized);
        }
        on_stage(PROGRESS_NORMALIZE_DONE);

        if request.has_bracketing() {
            checkpoint!(cancel, PipelineStage::BuildManifest);
            let manifest = write_manifest(scratch, &parts)?;

            checkpoint!(cancel, PipelineStage::Concatenate);
            let concat = EncodeCommand::concat(&manifest, profile, &request.output_path);
            let concatenated =
                run_with_fallback(runner, &concat, hardware, self.settings.concat_timeout, cancel)
                    .await;
            if !matches!(concatenated, Ok(StageOutcome::Ok(()))) {
                discard_partial_output(&request.output_path);
            }
            stage!(cancel, PipelineStage::Concatenate, concatenated);
        } else {
            // The cut is already encoded with the canonical profile, so with
            // nothing to bracket it is the finished clip
            checkpoint!(cancel, PipelineStage::Concatenate);
            PathUtils::promote(&main_part, &request.output_path)?;
        }
        on_stage(PROGRESS_CLIP_DONE);

        info!("Clip written to {}", request.output_path.display());
        Ok(ClipOutcome::Completed {
            output: request.output_path.clone(),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    }
}

fn discard_partial_output(path: &Path) {
    if path.is_file() {
        match std::fs::remove_file(path) {
            Ok(()) => debug!("Removed partial output {}", path.display()),
            Err(e) => warn!("Failed to remove partial output {}: {}", path.display(), e),
        }
    }
}
