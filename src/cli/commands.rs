//! Command implementations

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::adapters::{AppConfig, StaticEncoderCatalog, TomlConfigAdapter};
use crate::app::{AppContainer, BatchInput, DefaultAppContainer};
use crate::cli::{ClipArgs, Cli, EncodersArgs, ProbeArgs};
use crate::domain::model::*;
use crate::engine::{ConsoleProgressSink, JsonProgressSink};
use crate::ports::{EncoderCatalogPort, ProgressSink};

/// Exit code after the user stopped a batch
pub const EXIT_STOPPED: u8 = 130;

/// Load the configuration file and apply global CLI overrides
pub fn load_config(cli: &Cli) -> Result<(AppConfig, Option<PathBuf>)> {
    let (mut config, source) = TomlConfigAdapter::load(cli.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(ffmpeg) = &cli.ffmpeg {
        config.tools.ffmpeg = Some(ffmpeg.clone());
    }
    if let Some(ffprobe) = &cli.ffprobe {
        config.tools.ffprobe = Some(ffprobe.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.log_json {
        config.logging.json = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok((config, source))
}

/// Apply clip-specific CLI overrides on top of the loaded configuration
pub fn apply_clip_overrides(config: &mut AppConfig, args: &ClipArgs) -> Result<()> {
    if let Some(encoder) = &args.hw_encoder {
        config.encoding.hw_encoder = Some(EncoderId::parse(encoder)?);
    }
    if args.no_hw_accel {
        config.encoding.hw_acceleration = false;
    }
    if args.lossless {
        config.encoding.lossless = true;
    }
    if let Some(policy) = &args.on_failure {
        config.batch.on_failure = FailurePolicy::parse(policy)?;
    }
    Ok(())
}

/// Collect `--ranges` and every `--range` in order
pub fn collect_ranges(args: &ClipArgs) -> Result<Vec<TimeRange>> {
    let mut ranges = Vec::new();
    if let Some(list) = &args.ranges {
        ranges.extend(
            TimeRange::parse_list(list).with_context(|| format!("Invalid ranges '{}'", list))?,
        );
    }
    for pair in &args.range {
        ranges.push(
            TimeRange::parse_pair(pair).with_context(|| format!("Invalid range '{}'", pair))?,
        );
    }
    Ok(ranges)
}

/// Execute the clip command
pub async fn clip(args: ClipArgs, config: &AppConfig) -> Result<ExitCode> {
    info!("Starting clip operation");
    info!("Input: {}", args.input.display());
    info!("Output directory: {}", args.output_dir.display());

    let input = BatchInput {
        source: args.input.clone(),
        ranges: collect_ranges(&args)?,
        output_dir: args.output_dir.clone(),
        intro: args.intro.clone(),
        outro: args.outro.clone(),
        lossless: config.encoding.lossless,
        hw_encoder: config.encoding.hw_encoder,
    };
    let requests = input.into_requests().context("Pre-flight check failed")?;
    info!("Prepared {} clip(s)", requests.len());

    let container = DefaultAppContainer::from_config(config);
    let batch = container.batch_interactor();
    let sink: Arc<dyn ProgressSink> = if args.json {
        Arc::new(JsonProgressSink::new(true))
    } else {
        let verbose = matches!(config.logging.level.as_str(), "debug" | "trace");
        Arc::new(ConsoleProgressSink::new(verbose))
    };

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current step");
                cancel.cancel();
            }
        })
    };

    let worker = {
        let cancel = cancel.clone();
        let sink = Arc::clone(&sink);
        tokio::spawn(async move { batch.run_batch(&requests, &cancel, sink.as_ref()).await })
    };
    let report = worker.await.context("Batch task failed")?;
    interrupt.abort();

    Ok(match report.status {
        BatchStatus::Completed => ExitCode::SUCCESS,
        BatchStatus::StoppedByUser => ExitCode::from(EXIT_STOPPED),
        BatchStatus::Failed { .. } => ExitCode::FAILURE,
    })
}

/// Execute the probe command
pub async fn probe(args: ProbeArgs, config: &AppConfig) -> Result<ExitCode> {
    info!("Starting probe operation");
    let container = DefaultAppContainer::from_config(config);
    let response = container
        .inspect_interactor()
        .execute(&args.input, &CancellationToken::new())
        .await
        .context("Failed to probe input file")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("File: {}", response.path.display());
        println!(
            "Duration: {} ({:.3}s)",
            response.duration, response.duration_secs
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Execute the encoders command
pub async fn encoders(args: EncodersArgs, config: &AppConfig) -> Result<ExitCode> {
    let catalog = if args.detect {
        let container = DefaultAppContainer::from_config(config);
        let runner = container.command_runner();
        StaticEncoderCatalog::detect(runner.as_ref(), &CancellationToken::new())
            .await
            .context("Failed to query ffmpeg encoders")?
    } else {
        StaticEncoderCatalog::from_config(config.encoding.available_encoders.clone())
    };

    let encoders = catalog.available_encoders();
    if args.json {
        let entries: Vec<_> = encoders
            .iter()
            .map(|(name, id)| {
                serde_json::json!({
                    "name": name,
                    "id": id,
                    "codec": id.codec_name(),
                })
            })
            .collect();
        let body = serde_json::json!({
            "verified": catalog.is_verified(),
            "hw_acceleration": config.encoding.hw_acceleration,
            "encoders": entries,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(ExitCode::SUCCESS);
    }

    if !catalog.is_any_available() {
        println!("No hardware encoders available; clips are encoded with {}", SOFTWARE_CODEC);
        return Ok(ExitCode::SUCCESS);
    }
    for (name, id) in &encoders {
        println!("{:<16} {:<6} {}", name, id, id.codec_name());
    }
    if !catalog.is_verified() {
        println!("(not verified on this machine; failures fall back to {})", SOFTWARE_CODEC);
    }
    if !config.encoding.hw_acceleration {
        println!("Hardware acceleration is disabled in the configuration");
    }
    Ok(ExitCode::SUCCESS)
}
