//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the clip command
#[derive(Args, Debug)]
pub struct ClipArgs {
    /// Source video file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Comma-separated ranges, e.g. "0:10-0:20, 1:00-1:30"
    #[arg(long)]
    pub ranges: Option<String>,

    /// A single range (H:MM:SS, MM:SS or SS on each side); repeatable
    #[arg(short, long = "range")]
    pub range: Vec<String>,

    /// Existing directory receiving Clip_<n>_<name>.mp4
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Clip played before every extracted segment
    #[arg(long)]
    pub intro: Option<PathBuf>,

    /// Clip played after every extracted segment
    #[arg(long)]
    pub outro: Option<PathBuf>,

    /// Use the higher quality target
    #[arg(long)]
    pub lossless: bool,

    /// Hardware encoder family (nvenc, amf, qsv)
    #[arg(long, env = "BULKCLIP_HW_ENCODER")]
    pub hw_encoder: Option<String>,

    /// Never use a hardware encoder
    #[arg(long)]
    pub no_hw_accel: bool,

    /// What to do after a clip fails (abort, continue)
    #[arg(long, env = "BULKCLIP_ON_FAILURE")]
    pub on_failure: Option<String>,

    /// Print progress and the final report as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Media file to inspect
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the encoders command
#[derive(Args, Debug)]
pub struct EncodersArgs {
    /// Ask ffmpeg which hardware encoders it was built with
    #[arg(long)]
    pub detect: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
