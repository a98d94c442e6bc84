//! Turning user input into validated clip requests

use std::path::PathBuf;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::utils::PathUtils;

/// Everything the user supplies for one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInput {
    pub source: PathBuf,
    pub ranges: Vec<TimeRange>,
    pub output_dir: PathBuf,
    pub intro: Option<PathBuf>,
    pub outro: Option<PathBuf>,
    pub lossless: bool,
    pub hw_encoder: Option<EncoderId>,
}

impl BatchInput {
    /// Check the inputs exist before any process is started
    pub fn preflight(&self) -> Result<(), DomainError> {
        PathUtils::require_file(&self.source, "Source")?;
        if let Some(intro) = &self.intro {
            PathUtils::require_file(intro, "Intro")?;
        }
        if let Some(outro) = &self.outro {
            PathUtils::require_file(outro, "Outro")?;
        }
        PathUtils::require_dir(&self.output_dir)?;
        if self.ranges.is_empty() {
            return Err(DomainError::BadArgs(
                "At least one time range is required".to_string(),
            ));
        }
        Ok(())
    }

    /// One request per range, named `Clip_<i>_<stem>.mp4`
    pub fn into_requests(self) -> Result<Vec<ClipRequest>, DomainError> {
        self.preflight()?;
        Ok(self
            .ranges
            .iter()
            .enumerate()
            .map(|(offset, range)| {
                let output =
                    PathUtils::clip_output_path(&self.output_dir, &self.source, offset + 1);
                ClipRequest::new(self.source.clone(), *range, output)
                    .with_intro(self.intro.clone())
                    .with_outro(self.outro.clone())
                    .with_lossless(self.lossless)
                    .with_hw_encoder(self.hw_encoder)
            })
            .collect())
    }
}
