//! Shared test doubles for the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use bulkclip::adapters::{FFprobeAdapter, StaticEncoderCatalog};
use bulkclip::app::{DefaultAppContainer, PipelineSettings};
use bulkclip::domain::errors::DomainError;
use bulkclip::domain::model::*;
use bulkclip::ports::{CommandPort, EncoderCatalogPort, ProgressSink};

type Matcher = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

/// One recorded invocation
#[derive(Debug, Clone)]
pub struct Call {
    pub kind: ToolKind,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
}

impl Call {
    /// Value following `flag`
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .windows(2)
            .find(|pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
    }

    pub fn video_codec(&self) -> Option<&str> {
        self.value_of("-c:v")
    }

    pub fn output(&self) -> &str {
        self.args.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_concat(&self) -> bool {
        self.value_of("-f") == Some("concat")
    }
}

/// How the n-th transcoder call reacts to the cancellation it triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interruption {
    /// The runner notices the token first
    Cancelled,
    /// The tool received the terminal's SIGINT and exited on its own
    ToolExited,
}

/// stderr of an ffmpeg that was interrupted mid-encode
pub const INTERRUPTED_STDERR: &str = "Exiting normally, received signal 2.
Error writing trailer of main.mp4: Immediate exit requested";

/// In-memory ffmpeg/ffprobe stand-in.
///
/// Transcoder calls create a small file at their last argument unless a
/// failure rule matches. Prober calls answer with a fixed duration.
pub struct ScriptedRunner {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Vec<(Matcher, String)>>,
    manifests: Mutex<Vec<String>>,
    probe_stdout: Mutex<String>,
    transcoder_calls: AtomicUsize,
    cancel_on: Mutex<Option<(usize, CancellationToken, Interruption)>>,
    transcoder_missing: Mutex<bool>,
    concat_times_out: Mutex<bool>,
    panics: Mutex<Vec<Matcher>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            manifests: Mutex::new(Vec::new()),
            probe_stdout: Mutex::new("120.000000\n".to_string()),
            transcoder_calls: AtomicUsize::new(0),
            cancel_on: Mutex::new(None),
            transcoder_missing: Mutex::new(false),
            concat_times_out: Mutex::new(false),
            panics: Mutex::new(Vec::new()),
        })
    }

    /// Answer duration queries with `seconds`
    pub fn with_duration(self: Arc<Self>, seconds: f64) -> Arc<Self> {
        *self.probe_stdout.lock().unwrap() = format!("{:.6}\n", seconds);
        self
    }

    /// Fail every transcoder call whose arguments satisfy `matcher`
    pub fn fail_when<F>(self: Arc<Self>, matcher: F, stderr: &str) -> Arc<Self>
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.failures
            .lock()
            .unwrap()
            .push((Box::new(matcher), stderr.to_string()));
        self
    }

    /// Cancel `token` while the n-th (1-based) transcoder call is running
    pub fn cancel_during(self: Arc<Self>, call: usize, token: &CancellationToken) -> Arc<Self> {
        *self.cancel_on.lock().unwrap() = Some((call, token.clone(), Interruption::Cancelled));
        self
    }

    /// Like `cancel_during`, but the tool exits with code 255 before the
    /// runner reacts, as ffmpeg does when it shares the terminal's SIGINT
    pub fn interrupt_during(self: Arc<Self>, call: usize, token: &CancellationToken) -> Arc<Self> {
        *self.cancel_on.lock().unwrap() = Some((call, token.clone(), Interruption::ToolExited));
        self
    }

    /// Concat calls leave a partial output behind and time out
    pub fn concat_times_out(self: Arc<Self>) -> Arc<Self> {
        *self.concat_times_out.lock().unwrap() = true;
        self
    }

    /// Panic inside every transcoder call whose arguments satisfy `matcher`
    pub fn panic_when<F>(self: Arc<Self>, matcher: F) -> Arc<Self>
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.panics.lock().unwrap().push(Box::new(matcher));
        self
    }

    /// Behave as if ffmpeg could not be found
    pub fn without_transcoder(self: Arc<Self>) -> Arc<Self> {
        *self.transcoder_missing.lock().unwrap() = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn transcoder_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.kind == ToolKind::Transcoder)
            .collect()
    }

    /// Contents of every concat manifest seen, read at call time
    pub fn manifests(&self) -> Vec<String> {
        self.manifests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandPort for ScriptedRunner {
    async fn run(
        &self,
        args: &[String],
        kind: ToolKind,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DomainError> {
        if kind == ToolKind::Transcoder && *self.transcoder_missing.lock().unwrap() {
            return Err(DomainError::ToolNotFound("ffmpeg is not on PATH".to_string()));
        }
        if cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }

        self.calls.lock().unwrap().push(Call {
            kind,
            args: args.to_vec(),
            timeout,
        });

        if kind == ToolKind::Prober {
            return Ok(RunOutcome::Exited(ProcessOutput {
                exit_code: 0,
                stdout: self.probe_stdout.lock().unwrap().clone(),
                stderr: String::new(),
            }));
        }

        let number = self.transcoder_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((at, token, interruption)) = self.cancel_on.lock().unwrap().as_ref() {
            if *at == number {
                token.cancel();
                return Ok(match interruption {
                    Interruption::Cancelled => RunOutcome::Cancelled,
                    Interruption::ToolExited => RunOutcome::Exited(ProcessOutput {
                        exit_code: 255,
                        stdout: String::new(),
                        stderr: INTERRUPTED_STDERR.to_string(),
                    }),
                });
            }
        }

        if self.panics.lock().unwrap().iter().any(|matcher| matcher(args)) {
            panic!("scripted transcoder panic");
        }

        if let Some(at) = args.iter().position(|a| a == "concat") {
            if let Some(manifest) = args[at..].windows(2).find(|w| w[0] == "-i") {
                let contents = std::fs::read_to_string(&manifest[1]).unwrap_or_default();
                self.manifests.lock().unwrap().push(contents);
            }
        }

        if *self.concat_times_out.lock().unwrap() && args.iter().any(|a| a == "concat") {
            if let Some(output) = args.last() {
                std::fs::write(output, b"partial")?;
            }
            return Ok(RunOutcome::TimedOut);
        }

        for (matcher, stderr) in self.failures.lock().unwrap().iter() {
            if matcher(args) {
                return Ok(RunOutcome::Exited(ProcessOutput {
                    exit_code: 1,
                    stdout: String::new(),
                    stderr: stderr.clone(),
                }));
            }
        }

        if let Some(output) = args.last() {
            std::fs::write(output, b"fake media")?;
        }
        Ok(RunOutcome::Exited(ProcessOutput::default()))
    }
}

/// Sink that records everything it is told
#[derive(Default)]
pub struct RecordingSink {
    pub progress: Mutex<Vec<ProgressEvent>>,
    pub clips: Mutex<Vec<(usize, ClipOutcome)>>,
    pub batches: Mutex<Vec<BatchReport>>,
}

impl RecordingSink {
    pub fn overall(&self) -> Vec<f64> {
        self.progress
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.overall_percent)
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, event: ProgressEvent) {
        self.progress.lock().unwrap().push(event);
    }

    fn on_clip_finished(&self, clip_index: usize, outcome: &ClipOutcome) {
        self.clips
            .lock()
            .unwrap()
            .push((clip_index, outcome.clone()));
    }

    fn on_batch_finished(&self, report: &BatchReport) {
        self.batches.lock().unwrap().push(report.clone());
    }
}

/// Temporary workspace with a source, intro, outro and output directory
pub struct Fixture {
    pub dir: TempDir,
    pub source: PathBuf,
    pub intro: PathBuf,
    pub outro: PathBuf,
    pub output_dir: PathBuf,
    pub scratch_root: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("lecture.mp4");
        let intro = dir.path().join("intro.mov");
        let outro = dir.path().join("outro.mov");
        for file in [&source, &intro, &outro] {
            std::fs::write(file, b"media").unwrap();
        }
        let output_dir = dir.path().join("out");
        let scratch_root = dir.path().join("scratch");
        std::fs::create_dir(&output_dir).unwrap();
        std::fs::create_dir(&scratch_root).unwrap();
        Self {
            dir,
            source,
            intro,
            outro,
            output_dir,
            scratch_root,
        }
    }

    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            hw_acceleration: true,
            concat_timeout: Some(Duration::from_secs(600)),
            scratch_root: Some(self.scratch_root.clone()),
        }
    }

    pub fn output(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("Clip_{}_lecture.mp4", index))
    }

    pub fn request(&self, index: usize, range: &str) -> ClipRequest {
        ClipRequest::new(
            self.source.clone(),
            TimeRange::parse_pair(range).unwrap(),
            self.output(index),
        )
    }

    /// Requests for `ranges`, numbered from 1
    pub fn requests(&self, ranges: &[&str]) -> Vec<ClipRequest> {
        ranges
            .iter()
            .enumerate()
            .map(|(offset, range)| self.request(offset + 1, range))
            .collect()
    }

    /// Container whose catalog lists no hardware encoder
    pub fn software_container(
        &self,
        runner: &Arc<ScriptedRunner>,
        policy: FailurePolicy,
    ) -> DefaultAppContainer {
        self.container(runner, StaticEncoderCatalog::new(Vec::new()), policy)
    }

    pub fn container(
        &self,
        runner: &Arc<ScriptedRunner>,
        catalog: StaticEncoderCatalog,
        policy: FailurePolicy,
    ) -> DefaultAppContainer {
        self.container_with(runner, catalog, self.settings(), policy)
    }

    pub fn container_with(
        &self,
        runner: &Arc<ScriptedRunner>,
        catalog: StaticEncoderCatalog,
        settings: PipelineSettings,
        policy: FailurePolicy,
    ) -> DefaultAppContainer {
        let port: Arc<dyn CommandPort> = runner.clone();
        let catalog: Arc<dyn EncoderCatalogPort> = Arc::new(catalog);
        DefaultAppContainer::with_ports(
            Arc::clone(&port),
            Arc::new(FFprobeAdapter::new(port)),
            catalog,
            settings,
            policy,
        )
    }

    /// Entries left behind in the scratch root
    pub fn scratch_entries(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.scratch_root)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}

/// Whether `path` ends with `suffix` as a string
pub fn ends_with(path: &str, suffix: &str) -> bool {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy() == suffix)
        .unwrap_or(false)
}
