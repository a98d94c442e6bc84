//! bulkclip
//!
//! Batch clip extraction from one video with optional intro/outro, driven by
//! ffmpeg and ffprobe.
//!
//! # Usage
//!
//! ```bash
//! bulkclip clip -i talk.mp4 -o clips --ranges "0:10-0:20, 1:00-1:30" --intro intro.mp4
//! bulkclip probe -i talk.mp4
//! bulkclip encoders --detect
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use bulkclip::adapters::init_logging;
use bulkclip::cli::{commands, Cli, Commands};

/// Main entry point for the bulkclip CLI application
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let (mut config, source) = commands::load_config(&cli)?;
    init_logging(&config.logging.level, config.logging.json)?;

    match &source {
        Some(path) => info!("Using configuration from {}", path.display()),
        None => debug!("Using built-in configuration defaults"),
    }

    match cli.command {
        Commands::Clip(args) => {
            commands::apply_clip_overrides(&mut config, &args)?;
            commands::clip(args, &config).await
        }
        Commands::Probe(args) => commands::probe(args, &config).await,
        Commands::Encoders(args) => commands::encoders(args, &config).await,
    }
}
