//! Path helpers for clip outputs and scratch files

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::errors::DomainError;

/// Extension of every produced clip
pub const CLIP_EXTENSION: &str = "mp4";

/// Path utilities for clip naming and file placement
pub struct PathUtils;

impl PathUtils {
    /// File stem of the source, falling back to "video"
    pub fn source_stem(source: &Path) -> String {
        source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "video".to_string())
    }

    /// Output path for the 1-based clip index: `Clip_<i>_<stem>.mp4`
    pub fn clip_output_path(output_dir: &Path, source: &Path, clip_index: usize) -> PathBuf {
        output_dir.join(format!(
            "Clip_{}_{}.{}",
            clip_index,
            Self::source_stem(source),
            CLIP_EXTENSION
        ))
    }

    /// Fail with `FileNotFound` unless `path` is an existing file
    pub fn require_file(path: &Path, role: &str) -> Result<(), DomainError> {
        if path.is_file() {
            Ok(())
        } else {
            Err(DomainError::FileNotFound(format!(
                "{} file {}",
                role,
                path.display()
            )))
        }
    }

    /// Fail with `FileNotFound` unless `path` is an existing directory
    pub fn require_dir(path: &Path) -> Result<(), DomainError> {
        if path.is_dir() {
            Ok(())
        } else {
            Err(DomainError::FileNotFound(format!(
                "output directory {}",
                path.display()
            )))
        }
    }

    /// Move a finished scratch file to its final location.
    ///
    /// Rename fails across filesystems, in which case the file is copied.
    pub fn promote(from: &Path, to: &Path) -> Result<(), DomainError> {
        match std::fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(
                    "Rename {} -> {} failed ({}), copying instead",
                    from.display(),
                    to.display(),
                    e
                );
                std::fs::copy(from, to)?;
                Ok(())
            }
        }
    }
}
