//! Encoder selection with hardware-to-software fallback

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::domain::rules::DiagnosticExtractor;
use crate::engine::normalize::EncodeCommand;
use crate::ports::CommandPort;

/// Run an encode, retrying once in software if a hardware encoder fails.
///
/// When `hardware_enabled` is false a hardware profile is rewritten to
/// software before the first attempt. Timeouts and cancellation are
/// returned as-is and never trigger the retry.
pub async fn run_with_fallback(
    runner: &dyn CommandPort,
    command: &EncodeCommand,
    hardware_enabled: bool,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<StageOutcome<()>, DomainError> {
    let first = if command.profile.is_hardware() && !hardware_enabled {
        info!(
            "Hardware acceleration unavailable, encoding with {}",
            SOFTWARE_CODEC
        );
        command.with_profile(command.profile.to_software())
    } else {
        command.clone()
    };

    let outcome = runner
        .run(&first.to_args(), ToolKind::Transcoder, timeout, cancel)
        .await?;

    match outcome {
        // The tool saw the interrupt before the runner did
        RunOutcome::Exited(output) if !output.success() && cancel.is_cancelled() => {
            info!(
                "{} exited with code {} after cancellation",
                first.profile.codec, output.exit_code
            );
            Ok(StageOutcome::Cancelled)
        }
        RunOutcome::Exited(output) if !output.success() && first.profile.is_hardware() => {
            warn!(
                "{} failed ({}), retrying with {}",
                first.profile.codec,
                DiagnosticExtractor::failure_reason(ToolKind::Transcoder, &output),
                SOFTWARE_CODEC
            );
            let fallback = first.with_profile(first.profile.to_software());
            let retried = runner
                .run(&fallback.to_args(), ToolKind::Transcoder, timeout, cancel)
                .await?;
            Ok(match interpret(retried) {
                StageOutcome::Failed(_) if cancel.is_cancelled() => StageOutcome::Cancelled,
                other => other,
            })
        }
        other => Ok(interpret(other)),
    }
}

/// Map a finished invocation onto a stage outcome
pub fn interpret(outcome: RunOutcome) -> StageOutcome<()> {
    match outcome {
        RunOutcome::Exited(output) if output.success() => StageOutcome::Ok(()),
        RunOutcome::Exited(output) => StageOutcome::Failed(DiagnosticExtractor::failure_reason(
            ToolKind::Transcoder,
            &output,
        )),
        RunOutcome::TimedOut => StageOutcome::TimedOut,
        RunOutcome::Cancelled => StageOutcome::Cancelled,
    }
}
