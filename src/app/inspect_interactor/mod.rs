// Inspect interactor - Reports the probed duration of a media file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::errors::*;
use crate::ports::*;
use crate::utils::format_seconds_precise;

/// Result of inspecting one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectResponse {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub duration: String,
}

/// Interactor for media file inspection use case
pub struct InspectInteractor {
    probe_port: Arc<dyn ProbePort>,
}

impl InspectInteractor {
    /// Create new inspect interactor with injected ports
    pub fn new(probe_port: Arc<dyn ProbePort>) -> Self {
        Self { probe_port }
    }

    /// Probe `path` and summarize its duration
    pub async fn execute(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<InspectResponse, DomainError> {
        info!("Inspecting {}", path.display());
        let duration_secs = self.probe_port.probe_duration(path, cancel).await?;
        Ok(InspectResponse {
            path: path.to_path_buf(),
            duration_secs,
            duration: format_seconds_precise(duration_secs),
        })
    }
}
