//! CLI module for bulkclip
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::{ClipArgs, EncodersArgs, ProbeArgs};

/// bulkclip - batch clip extraction with intro/outro bracketing
///
/// Cuts any number of time ranges out of one video, optionally wraps each
/// clip with an intro and an outro, and writes `Clip_<n>_<name>.mp4` files.
/// Requires ffmpeg and ffprobe, either bundled next to the executable in an
/// `ffmpeg/` directory, configured explicitly, or on PATH.
#[derive(Parser, Debug)]
#[command(name = "bulkclip")]
#[command(about = "Batch clip extraction with optional intro and outro")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: ./bulkclip.toml, then the user config dir)
    #[arg(long, global = true, env = "BULKCLIP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "BULKCLIP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to the ffmpeg executable
    #[arg(long, global = true, env = "BULKCLIP_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe executable
    #[arg(long, global = true, env = "BULKCLIP_FFPROBE")]
    pub ffprobe: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cut a batch of clips from one video
    Clip(ClipArgs),
    /// Print the duration of a media file
    Probe(ProbeArgs),
    /// List the hardware encoders that may be used
    Encoders(EncodersArgs),
}
