//! Progress tracking and sinks for batch runs

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::domain::model::*;
use crate::ports::ProgressSink;
use crate::utils::time::format_duration;

/// Point-in-time view of batch progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Percentage across the whole batch
    pub percent: f64,
    /// Time since the batch started
    pub elapsed: Duration,
    /// Estimated time remaining, once any progress has been made
    pub eta: Option<Duration>,
}

/// Elapsed/remaining time estimation from a percentage
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<Mutex<ProgressTrackerInner>>,
}

struct ProgressTrackerInner {
    start_time: Instant,
    last: ProgressSnapshot,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    /// Create a tracker starting now
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    /// Create a tracker with an explicit start time
    pub fn started_at(start_time: Instant) -> Self {
        let inner = ProgressTrackerInner {
            start_time,
            last: ProgressSnapshot {
                percent: 0.0,
                elapsed: Duration::ZERO,
                eta: None,
            },
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Record a new overall percentage and estimate the remaining time
    pub fn update(&self, percent: f64) -> ProgressSnapshot {
        self.update_at(percent, Instant::now())
    }

    /// Same as [`update`](Self::update) with an explicit clock reading
    pub fn update_at(&self, percent: f64, now: Instant) -> ProgressSnapshot {
        let Ok(mut inner) = self.inner.lock() else {
            return ProgressSnapshot {
                percent,
                elapsed: Duration::ZERO,
                eta: None,
            };
        };

        let percent = percent.clamp(0.0, 100.0);
        let elapsed = now.saturating_duration_since(inner.start_time);
        let eta = Self::estimate_remaining(percent, elapsed);
        inner.last = ProgressSnapshot {
            percent,
            elapsed,
            eta,
        };
        inner.last
    }

    /// Remaining time assuming the rate so far holds
    pub fn estimate_remaining(percent: f64, elapsed: Duration) -> Option<Duration> {
        if percent <= 0.0 {
            return None;
        }
        if percent >= 100.0 {
            return Some(Duration::ZERO);
        }
        let total = elapsed.as_secs_f64() * 100.0 / percent;
        Some(Duration::from_secs_f64((total - elapsed.as_secs_f64()).max(0.0)))
    }

    /// Most recent snapshot
    pub fn last(&self) -> Option<ProgressSnapshot> {
        self.inner.lock().ok().map(|inner| inner.last)
    }
}

/// Console sink drawing a progress bar with elapsed and remaining time
pub struct ConsoleProgressSink {
    tracker: ProgressTracker,
    verbose: bool,
}

impl ConsoleProgressSink {
    pub fn new(verbose: bool) -> Self {
        Self {
            tracker: ProgressTracker::new(),
            verbose,
        }
    }
}

impl ProgressSink for ConsoleProgressSink {
    fn on_progress(&self, event: ProgressEvent) {
        let snapshot = self.tracker.update(event.overall_percent);
        let bar_length = 20;
        let filled = ((snapshot.percent / 100.0) * bar_length as f64) as usize;
        let bar = "#".repeat(filled) + &"-".repeat(bar_length - filled.min(bar_length));
        let remaining = snapshot
            .eta
            .map(format_duration)
            .unwrap_or_else(|| "--:--:--".to_string());

        if self.verbose && event.clip_index > 0 {
            println!(
                "[{}] {:>5.1}% clip {} at {}% | elapsed {} | remaining {}",
                bar,
                snapshot.percent,
                event.clip_index,
                event.clip_percent,
                format_duration(snapshot.elapsed),
                remaining
            );
        } else {
            println!(
                "[{}] {:>5.1}% | elapsed {} | remaining {}",
                bar,
                snapshot.percent,
                format_duration(snapshot.elapsed),
                remaining
            );
        }
    }

    fn on_clip_finished(&self, clip_index: usize, outcome: &ClipOutcome) {
        match outcome {
            ClipOutcome::Completed { output } => {
                println!("Clip {} written to {}", clip_index, output.display());
            }
            other => {
                if let Some(message) = other.message(clip_index) {
                    println!("{}", message);
                }
            }
        }
    }

    fn on_batch_finished(&self, report: &BatchReport) {
        println!(
            "{} ({}/{} clips)",
            report.message(),
            report.completed_clips(),
            report.total_clips
        );
    }
}

/// JSON-lines sink for machine consumers
pub struct JsonProgressSink {
    tracker: ProgressTracker,
    output_progress_events: bool,
}

impl JsonProgressSink {
    pub fn new(output_progress_events: bool) -> Self {
        Self {
            tracker: ProgressTracker::new(),
            output_progress_events,
        }
    }
}

impl ProgressSink for JsonProgressSink {
    fn on_progress(&self, event: ProgressEvent) {
        let snapshot = self.tracker.update(event.overall_percent);
        if self.output_progress_events {
            let line = serde_json::json!({
                "event": "progress",
                "clip_index": event.clip_index,
                "clip_percent": event.clip_percent,
                "overall_percent": snapshot.percent,
                "elapsed_secs": snapshot.elapsed.as_secs_f64(),
                "eta_secs": snapshot.eta.map(|eta| eta.as_secs_f64()),
                "timestamp": chrono::Utc::now().to_rfc3339()
            });
            println!("{}", line);
        }
    }

    fn on_clip_finished(&self, clip_index: usize, outcome: &ClipOutcome) {
        let line = serde_json::json!({
            "event": "clip_finished",
            "clip_index": clip_index,
            "outcome": outcome,
            "message": outcome.message(clip_index),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", line);
    }

    fn on_batch_finished(&self, report: &BatchReport) {
        let line = serde_json::json!({
            "event": "batch_finished",
            "message": report.message(),
            "report": report,
        });
        println!("{}", line);
    }
}

/// Sink that discards everything
pub struct NoOpProgressSink;

impl ProgressSink for NoOpProgressSink {
    fn on_progress(&self, _event: ProgressEvent) {}
    fn on_clip_finished(&self, _clip_index: usize, _outcome: &ClipOutcome) {}
    fn on_batch_finished(&self, _report: &BatchReport) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_remaining_linear() {
        let eta = ProgressTracker::estimate_remaining(25.0, Duration::from_secs(30)).unwrap();
        assert_eq!(eta.as_secs(), 90);
    }

    #[test]
    fn test_estimate_remaining_edges() {
        assert_eq!(ProgressTracker::estimate_remaining(0.0, Duration::from_secs(5)), None);
        assert_eq!(
            ProgressTracker::estimate_remaining(100.0, Duration::from_secs(5)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_tracker_update_clamps_and_records() {
        let start = Instant::now();
        let tracker = ProgressTracker::started_at(start);
        let snapshot = tracker.update_at(150.0, start + Duration::from_secs(10));
        assert_eq!(snapshot.percent, 100.0);
        assert_eq!(snapshot.elapsed, Duration::from_secs(10));
        assert_eq!(tracker.last(), Some(snapshot));
    }

    #[test]
    fn test_tracker_half_way() {
        let start = Instant::now();
        let tracker = ProgressTracker::started_at(start);
        let snapshot = tracker.update_at(50.0, start + Duration::from_secs(20));
        assert_eq!(snapshot.eta, Some(Duration::from_secs(20)));
    }
}
