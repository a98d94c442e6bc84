// Batch interactor - Runs the clips of a batch in order

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::app::clip_interactor::{ClipInteractor, ClipRun};
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Interactor for the batch use case
pub struct BatchInteractor {
    probe_port: Arc<dyn ProbePort>,
    pipeline: Arc<ClipInteractor>,
    policy: FailurePolicy,
}

impl BatchInteractor {
    /// Create new batch interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        pipeline: Arc<ClipInteractor>,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            probe_port,
            pipeline,
            policy,
        }
    }

    /// Run every request strictly in order and report the aggregate.
    ///
    /// Cancellation is checked before and after each clip; finished
    /// outputs are kept when the batch stops early.
    pub async fn run_batch(
        &self,
        requests: &[ClipRequest],
        cancel: &CancellationToken,
        sink: &dyn ProgressSink,
    ) -> BatchReport {
        let started_at = Utc::now();
        let total = requests.len();
        let mut clips = Vec::with_capacity(total);
        let mut first_failure: Option<(usize, String)> = None;
        let mut stopped = false;

        info!("Starting batch of {} clip(s)", total);
        sink.on_progress(ProgressEvent {
            clip_index: 0,
            clip_percent: 0,
            overall_percent: 0.0,
        });

        for (offset, request) in requests.iter().enumerate() {
            let index = offset + 1;
            if cancel.is_cancelled() {
                stopped = true;
                break;
            }

            let run = self.run_clip(index, total, request, cancel, sink).await;
            sink.on_clip_finished(index, &run.outcome);
            clips.push(ClipReport {
                index,
                range: request.range,
                output_path: request.output_path.clone(),
                outcome: run.outcome.clone(),
            });

            match &run.outcome {
                ClipOutcome::Completed { .. } => {}
                ClipOutcome::Cancelled => {
                    stopped = true;
                    break;
                }
                ClipOutcome::Failed { reason } => {
                    error!(clip = index, "Clip failed: {}", reason);
                    first_failure.get_or_insert_with(|| (index, reason.clone()));
                    if run.fatal {
                        warn!("Stopping batch: the failure affects every remaining clip");
                        break;
                    }
                    if self.policy == FailurePolicy::Abort {
                        break;
                    }
                }
            }

            if cancel.is_cancelled() && index < total {
                stopped = true;
                break;
            }
        }

        let status = if stopped {
            BatchStatus::StoppedByUser
        } else if let Some((clip_index, reason)) = first_failure {
            BatchStatus::Failed { clip_index, reason }
        } else {
            BatchStatus::Completed
        };

        let report = BatchReport {
            started_at,
            finished_at: Utc::now(),
            total_clips: total,
            clips,
            status,
        };
        info!(
            "Batch finished: {} ({}/{} clips)",
            report.message(),
            report.completed_clips(),
            total
        );
        sink.on_batch_finished(&report);
        report
    }

    async fn run_clip(
        &self,
        index: usize,
        total: usize,
        request: &ClipRequest,
        cancel: &CancellationToken,
        sink: &dyn ProgressSink,
    ) -> ClipRun {
        info!(clip = index, total, range = %request.range, "Processing clip");

        // The source may have changed since the batch was validated
        let duration = match self
            .probe_port
            .probe_duration(&request.source, cancel)
            .await
        {
            Ok(duration) => duration,
            Err(_) if cancel.is_cancelled() => return ClipRun::from_outcome(ClipOutcome::Cancelled),
            Err(e) => return ClipRun::from_error(&e),
        };

        if let Err(e) = RangeValidator::check(&request.range, duration) {
            return ClipRun::from_error(&e);
        }

        let on_stage = |clip_percent: u8| {
            sink.on_progress(ProgressEvent {
                clip_index: index,
                clip_percent,
                overall_percent: ProgressCalculator::overall(index, total, clip_percent),
            })
        };
        self.pipeline.execute(request, cancel, &on_stage).await
    }
}
