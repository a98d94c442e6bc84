// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Quality value used when lossless mode is requested (lower is better)
pub const LOSSLESS_QUALITY: u8 = 18;

/// Quality value used for standard output
pub const STANDARD_QUALITY: u8 = 23;

/// Canonical pixel format every concatenation input is normalized to
pub const CANONICAL_PIXEL_FORMAT: &str = "yuv420p";

/// Canonical audio codec
pub const CANONICAL_AUDIO_CODEC: &str = "aac";

/// Canonical audio sample rate in Hz
pub const CANONICAL_SAMPLE_RATE: u32 = 48_000;

/// Canonical audio channel count
pub const CANONICAL_AUDIO_CHANNELS: u32 = 2;

/// Software video codec used when no hardware encoder is in play
pub const SOFTWARE_CODEC: &str = "libx264";

/// Time specification in whole seconds, as typed by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSpec {
    pub seconds: u64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: u64) -> Self {
        Self { seconds }
    }

    /// Parse "H:MM:SS", "MM:SS" or "SS".
    ///
    /// The trailing segment counts seconds and every preceding segment the next
    /// higher unit. Segments are plain non-negative integers, so "1:90" is 150s.
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();
        if trimmed.is_empty() {
            return Err(DomainError::MalformedTime(time_str.to_string()));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        if parts.len() > 3 {
            return Err(DomainError::MalformedTime(time_str.to_string()));
        }

        let mut seconds: u64 = 0;
        let mut multiplier: u64 = 1;
        for part in parts.iter().rev() {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(DomainError::MalformedTime(time_str.to_string()));
            }
            let value = part
                .parse::<u64>()
                .map_err(|_| DomainError::MalformedTime(time_str.to_string()))?;
            seconds = value
                .checked_mul(multiplier)
                .and_then(|v| seconds.checked_add(v))
                .ok_or_else(|| DomainError::MalformedTime(time_str.to_string()))?;
            multiplier *= 60;
        }

        Ok(Self::from_seconds(seconds))
    }

    /// Seconds as floating point, for comparisons against probed durations
    pub fn as_seconds(&self) -> f64 {
        self.seconds as f64
    }

    /// Format as HH:MM:SS
    pub fn format_hms(&self) -> String {
        let hours = self.seconds / 3600;
        let minutes = (self.seconds % 3600) / 60;
        let secs = self.seconds % 60;
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// A requested [start, end) window of the source video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimeSpec,
    pub end: TimeSpec,
}

impl TimeRange {
    /// Create a range, rejecting empty or inverted windows
    pub fn new(start: TimeSpec, end: TimeSpec) -> Result<Self, DomainError> {
        if start >= end {
            return Err(DomainError::InvalidRange(format!(
                "start ({}) must be before end ({})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a start/end pair of time strings
    pub fn parse(start: &str, end: &str) -> Result<Self, DomainError> {
        Self::new(TimeSpec::parse(start)?, TimeSpec::parse(end)?)
    }

    /// Parse a single "start-end" pair such as "1:30-2:45"
    pub fn parse_pair(pair: &str) -> Result<Self, DomainError> {
        let trimmed = pair.trim();
        let (start, end) = trimmed
            .split_once('-')
            .ok_or_else(|| DomainError::MalformedTime(trimmed.to_string()))?;
        Self::parse(start, end)
    }

    /// Parse a comma-separated list of "start-end" pairs
    pub fn parse_list(text: &str) -> Result<Vec<Self>, DomainError> {
        text.split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(Self::parse_pair)
            .collect()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Which external executable a command targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Transcode / concat mode (ffmpeg)
    Transcoder,
    /// Inspection mode (ffprobe)
    Prober,
}

impl ToolKind {
    /// Base executable name without platform suffix
    pub fn executable_name(&self) -> &'static str {
        match self {
            ToolKind::Transcoder => "ffmpeg",
            ToolKind::Prober => "ffprobe",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable_name())
    }
}

/// Hardware encoder family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderId {
    /// NVIDIA NVENC
    Nvenc,
    /// AMD AMF
    Amf,
    /// Intel Quick Sync Video
    Qsv,
}

impl EncoderId {
    /// All supported families, in catalog order
    pub const ALL: [EncoderId; 3] = [EncoderId::Nvenc, EncoderId::Amf, EncoderId::Qsv];

    /// Parse a family name or its ffmpeg codec name
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_lowercase().as_str() {
            "nvenc" | "h264_nvenc" | "nvidia" => Ok(EncoderId::Nvenc),
            "amf" | "h264_amf" | "amd" => Ok(EncoderId::Amf),
            "qsv" | "h264_qsv" | "intel" | "quicksync" => Ok(EncoderId::Qsv),
            other => Err(DomainError::BadArgs(format!(
                "Unknown hardware encoder: {}. Valid encoders: nvenc, amf, qsv",
                other
            ))),
        }
    }

    /// Human-readable vendor name
    pub fn display_name(&self) -> &'static str {
        match self {
            EncoderId::Nvenc => "NVIDIA NVENC",
            EncoderId::Amf => "AMD AMF",
            EncoderId::Qsv => "Intel QuickSync",
        }
    }

    /// ffmpeg codec name of the H.264 encoder for this family
    pub fn codec_name(&self) -> &'static str {
        match self {
            EncoderId::Nvenc => "h264_nvenc",
            EncoderId::Amf => "h264_amf",
            EncoderId::Qsv => "h264_qsv",
        }
    }
}

impl fmt::Display for EncoderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncoderId::Nvenc => "nvenc",
            EncoderId::Amf => "amf",
            EncoderId::Qsv => "qsv",
        };
        f.write_str(name)
    }
}

/// Video encoder settings for one invocation
///
/// Each family names its preset and quality flags differently; keeping them
/// structured lets the fallback path swap families without touching the rest
/// of the argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeProfile {
    /// Hardware family, `None` for software
    pub encoder: Option<EncoderId>,
    pub codec: String,
    pub preset_flag: String,
    pub preset_value: String,
    pub quality_flag: String,
    pub quality_value: u8,
}

impl EncodeProfile {
    /// Software profile (libx264)
    pub fn software(lossless: bool) -> Self {
        Self {
            encoder: None,
            codec: SOFTWARE_CODEC.to_string(),
            preset_flag: "-preset".to_string(),
            preset_value: "fast".to_string(),
            quality_flag: "-crf".to_string(),
            quality_value: quality_for(lossless),
        }
    }

    /// Profile for the requested encoder family, or software when none
    pub fn for_encoder(encoder: Option<EncoderId>, lossless: bool) -> Self {
        let quality_value = quality_for(lossless);
        match encoder {
            None => Self::software(lossless),
            Some(EncoderId::Nvenc) => Self {
                encoder,
                codec: EncoderId::Nvenc.codec_name().to_string(),
                preset_flag: "-preset".to_string(),
                preset_value: "p4".to_string(),
                quality_flag: "-cq".to_string(),
                quality_value,
            },
            Some(EncoderId::Amf) => Self {
                encoder,
                codec: EncoderId::Amf.codec_name().to_string(),
                preset_flag: "-quality".to_string(),
                preset_value: "balanced".to_string(),
                quality_flag: "-qp_i".to_string(),
                quality_value,
            },
            Some(EncoderId::Qsv) => Self {
                encoder,
                codec: EncoderId::Qsv.codec_name().to_string(),
                preset_flag: "-preset".to_string(),
                preset_value: "medium".to_string(),
                quality_flag: "-global_quality".to_string(),
                quality_value,
            },
        }
    }

    /// Whether this profile targets a hardware encoder
    pub fn is_hardware(&self) -> bool {
        self.encoder.is_some()
    }

    /// Software profile with the same quality target
    pub fn to_software(&self) -> Self {
        Self {
            quality_value: self.quality_value,
            ..Self::software(false)
        }
    }

    /// Video encoder arguments for this profile
    pub fn video_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            self.preset_flag.clone(),
            self.preset_value.clone(),
        ];
        // AMF only honors -qp_* in constant-QP mode, and -qp_i alone leaves
        // P-frames at the encoder default
        if self.encoder == Some(EncoderId::Amf) {
            args.extend(["-rc".to_string(), "cqp".to_string()]);
            args.extend(["-qp_p".to_string(), self.quality_value.to_string()]);
        }
        args.push(self.quality_flag.clone());
        args.push(self.quality_value.to_string());
        args
    }
}

/// Quality value for the lossless flag
fn quality_for(lossless: bool) -> u8 {
    if lossless {
        LOSSLESS_QUALITY
    } else {
        STANDARD_QUALITY
    }
}

/// Captured result of a finished external process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// How an external invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Process exited on its own
    Exited(ProcessOutput),
    /// Process exceeded its timeout and was terminated
    TimedOut,
    /// Process was terminated by a cancellation request
    Cancelled,
}

/// Tagged result of one pipeline stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    Ok(T),
    Failed(String),
    Cancelled,
    TimedOut,
}

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    CutMain,
    NormalizeIntro,
    NormalizeOutro,
    BuildManifest,
    Concatenate,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::CutMain => "cut main segment",
            PipelineStage::NormalizeIntro => "normalize intro",
            PipelineStage::NormalizeOutro => "normalize outro",
            PipelineStage::BuildManifest => "build concat manifest",
            PipelineStage::Concatenate => "concatenate",
        };
        f.write_str(name)
    }
}

/// One clip to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRequest {
    pub source: PathBuf,
    pub range: TimeRange,
    pub intro: Option<PathBuf>,
    pub outro: Option<PathBuf>,
    pub lossless: bool,
    pub hw_encoder: Option<EncoderId>,
    pub output_path: PathBuf,
}

impl ClipRequest {
    /// Create a new clip request
    pub fn new(source: PathBuf, range: TimeRange, output_path: PathBuf) -> Self {
        Self {
            source,
            range,
            intro: None,
            outro: None,
            lossless: false,
            hw_encoder: None,
            output_path,
        }
    }

    /// Attach an intro clip
    pub fn with_intro(mut self, intro: Option<PathBuf>) -> Self {
        self.intro = intro;
        self
    }

    /// Attach an outro clip
    pub fn with_outro(mut self, outro: Option<PathBuf>) -> Self {
        self.outro = outro;
        self
    }

    /// Select lossless quality
    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.lossless = lossless;
        self
    }

    /// Select a hardware encoder family
    pub fn with_hw_encoder(mut self, encoder: Option<EncoderId>) -> Self {
        self.hw_encoder = encoder;
        self
    }

    /// Whether the clip needs a concatenation step
    pub fn has_bracketing(&self) -> bool {
        self.intro.is_some() || self.outro.is_some()
    }
}

/// Message shown when the user stopped processing
pub const STOPPED_BY_USER: &str = "Processing stopped by user";

/// Terminal result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClipOutcome {
    Completed { output: PathBuf },
    Failed { reason: String },
    Cancelled,
}

impl ClipOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ClipOutcome::Completed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClipOutcome::Cancelled)
    }

    /// User-facing message for a 1-based clip index, `None` on success
    pub fn message(&self, clip_index: usize) -> Option<String> {
        match self {
            ClipOutcome::Completed { .. } => None,
            ClipOutcome::Cancelled => Some(STOPPED_BY_USER.to_string()),
            ClipOutcome::Failed { reason } if reason.trim().is_empty() => Some(format!(
                "Clip {} failed without a specific error. Please check your settings.",
                clip_index
            )),
            ClipOutcome::Failed { reason } => {
                Some(format!("Error processing clip {}: {}", clip_index, reason))
            }
        }
    }
}

/// Per-clip entry of a batch report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipReport {
    /// 1-based position in the batch
    pub index: usize,
    pub range: TimeRange,
    pub output_path: PathBuf,
    pub outcome: ClipOutcome,
}

/// What to do with the remaining clips after one fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the batch at the first failure
    #[default]
    Abort,
    /// Report the failure and move on to the next clip
    Continue,
}

impl FailurePolicy {
    /// Parse failure policy from string
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_lowercase().as_str() {
            "abort" | "stop" => Ok(FailurePolicy::Abort),
            "continue" | "skip" => Ok(FailurePolicy::Continue),
            other => Err(DomainError::BadArgs(format!(
                "Invalid failure policy: {}. Valid policies: abort, continue",
                other
            ))),
        }
    }
}

/// Terminal state of the whole batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchStatus {
    Completed,
    StoppedByUser,
    Failed { clip_index: usize, reason: String },
}

/// Aggregated result of a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_clips: usize,
    pub clips: Vec<ClipReport>,
    pub status: BatchStatus,
}

impl BatchReport {
    /// Number of clips written successfully
    pub fn completed_clips(&self) -> usize {
        self.clips.iter().filter(|c| c.outcome.is_success()).count()
    }

    /// User-facing summary of the batch
    pub fn message(&self) -> String {
        match &self.status {
            BatchStatus::Completed => "Video clipping completed!".to_string(),
            BatchStatus::StoppedByUser => STOPPED_BY_USER.to_string(),
            BatchStatus::Failed { clip_index, reason } => ClipOutcome::Failed {
                reason: reason.clone(),
            }
            .message(*clip_index)
            .unwrap_or_default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == BatchStatus::Completed
    }
}

/// Progress notification for the sink
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// 1-based clip index, 0 before the first clip starts
    pub clip_index: usize,
    /// Stage percentage within the clip (0, 33, 66, 100)
    pub clip_percent: u8,
    /// Percentage across the whole batch
    pub overall_percent: f64,
}
