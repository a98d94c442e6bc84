// Ports - Interface definitions (contracts)

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for running the external media tools
#[async_trait]
pub trait CommandPort: Send + Sync {
    /// Run one invocation to completion, timeout or cancellation.
    ///
    /// A non-zero exit is a normal `RunOutcome::Exited`; only failures to
    /// locate or launch the tool are errors.
    async fn run(
        &self,
        args: &[String],
        kind: ToolKind,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DomainError>;
}

/// Port for media duration probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Duration of the media file in seconds
    async fn probe_duration(
        &self,
        file_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<f64, DomainError>;
}

/// Port for the hardware encoder catalog
pub trait EncoderCatalogPort: Send + Sync {
    /// Display name and id of every usable hardware encoder
    fn available_encoders(&self) -> Vec<(String, EncoderId)>;

    /// Whether any hardware encoder is usable
    fn is_any_available(&self) -> bool {
        !self.available_encoders().is_empty()
    }

    /// Whether a specific family is usable
    fn is_available(&self, encoder: EncoderId) -> bool {
        self.available_encoders()
            .iter()
            .any(|(_, id)| *id == encoder)
    }
}

/// Port receiving progress and results; implementations must not block
pub trait ProgressSink: Send + Sync {
    /// Stage progress of the current clip
    fn on_progress(&self, event: ProgressEvent);

    /// Terminal result of one clip (1-based index)
    fn on_clip_finished(&self, clip_index: usize, outcome: &ClipOutcome);

    /// Terminal result of the whole batch
    fn on_batch_finished(&self, report: &BatchReport);
}
