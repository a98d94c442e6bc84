//! Canonical encode, cut and concat command construction
//!
//! Every file that ends up in a concat manifest is re-encoded to the same
//! codec, pixel format and audio layout so the concat demuxer can join them.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::*;

/// File name of the concat manifest inside the scratch directory
pub const MANIFEST_FILE_NAME: &str = "concat_list.txt";

/// How the input side of an encode is described
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeInput {
    /// Whole media file
    File(PathBuf),
    /// A window of a media file, seeked on the output side
    Window { path: PathBuf, range: TimeRange },
    /// Concat demuxer manifest
    Manifest(PathBuf),
}

/// A single ffmpeg transcode invocation before rendering to arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeCommand {
    pub input: EncodeInput,
    pub profile: EncodeProfile,
    pub output: PathBuf,
    pub faststart: bool,
}

impl EncodeCommand {
    /// Cut `range` out of `source`, re-encoding to the canonical format
    pub fn cut(source: &Path, range: TimeRange, profile: EncodeProfile, output: &Path) -> Self {
        Self {
            input: EncodeInput::Window {
                path: source.to_path_buf(),
                range,
            },
            profile,
            output: output.to_path_buf(),
            faststart: false,
        }
    }

    /// Re-encode a whole intro/outro file to the canonical format
    pub fn normalize(input: &Path, profile: EncodeProfile, output: &Path) -> Self {
        Self {
            input: EncodeInput::File(input.to_path_buf()),
            profile,
            output: output.to_path_buf(),
            faststart: false,
        }
    }

    /// Join every file listed in `manifest` into the final output
    pub fn concat(manifest: &Path, profile: EncodeProfile, output: &Path) -> Self {
        Self {
            input: EncodeInput::Manifest(manifest.to_path_buf()),
            profile,
            output: output.to_path_buf(),
            faststart: true,
        }
    }

    /// Same command with a different encoder profile
    pub fn with_profile(&self, profile: EncodeProfile) -> Self {
        Self {
            profile,
            ..self.clone()
        }
    }

    /// Render the ffmpeg argument list
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into()];

        match &self.input {
            EncodeInput::File(path) => {
                args.push("-i".into());
                args.push(path_arg(path));
            }
            EncodeInput::Window { path, range } => {
                args.push("-i".into());
                args.push(path_arg(path));
                args.push("-ss".into());
                args.push(range.start.seconds.to_string());
                args.push("-to".into());
                args.push(range.end.seconds.to_string());
            }
            EncodeInput::Manifest(path) => {
                args.extend(["-f", "concat", "-safe", "0", "-i"].map(String::from));
                args.push(path_arg(path));
            }
        }

        // Primary video plus optional first audio stream; data and subtitle
        // streams would break the concat demuxer.
        args.extend(["-map", "0:v:0", "-map", "0:a:0?"].map(String::from));
        args.extend(self.profile.video_args());
        args.push("-pix_fmt".into());
        args.push(CANONICAL_PIXEL_FORMAT.into());
        args.push("-c:a".into());
        args.push(CANONICAL_AUDIO_CODEC.into());
        args.push("-ar".into());
        args.push(CANONICAL_SAMPLE_RATE.to_string());
        args.push("-ac".into());
        args.push(CANONICAL_AUDIO_CHANNELS.to_string());
        if self.faststart {
            args.push("-movflags".into());
            args.push("+faststart".into());
        }
        args.push(path_arg(&self.output));

        debug!("Rendered ffmpeg arguments: {:?}", args);
        args
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Render a concat demuxer manifest listing `parts` in order.
///
/// Paths are made absolute; a single quote inside a path is written as
/// `'\''` per the demuxer's quoting rules.
pub fn render_manifest(parts: &[PathBuf]) -> Result<String, DomainError> {
    let mut manifest = String::new();
    for part in parts {
        let absolute = std::path::absolute(part)?;
        let escaped = absolute.to_string_lossy().replace('\'', r"'\''");
        // Writing to a String cannot fail
        let _ = writeln!(manifest, "file '{}'", escaped);
    }
    Ok(manifest)
}

/// Write the manifest for `parts` into `scratch_dir`, returning its path
pub fn write_manifest(scratch_dir: &Path, parts: &[PathBuf]) -> Result<PathBuf, DomainError> {
    let manifest_path = scratch_dir.join(MANIFEST_FILE_NAME);
    std::fs::write(&manifest_path, render_manifest(parts)?)?;
    debug!(
        "Wrote concat manifest with {} entries to {}",
        parts.len(),
        manifest_path.display()
    );
    Ok(manifest_path)
}
