//! FFmpeg execution adapter
//!
//! Runs ffmpeg/ffprobe as child processes, capturing both output streams in
//! full while the process runs. Each invocation can be bounded by a timeout
//! and interrupted through a cancellation token; either ends with a graceful
//! termination request followed by a forced kill after a grace period.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Time a process gets to exit after a termination request
pub const DEFAULT_TERMINATION_GRACE: Duration = Duration::from_secs(5);

/// Resolves the executable for each tool kind.
///
/// Lookup order: configured path, the bundled `ffmpeg/` directory next to
/// the running executable, then `PATH`.
#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
}

impl ToolLocator {
    pub fn new(ffmpeg: Option<PathBuf>, ffprobe: Option<PathBuf>) -> Self {
        Self { ffmpeg, ffprobe }
    }

    fn configured(&self, kind: ToolKind) -> Option<&Path> {
        match kind {
            ToolKind::Transcoder => self.ffmpeg.as_deref(),
            ToolKind::Prober => self.ffprobe.as_deref(),
        }
    }

    /// Location of the bundled copy of `kind`, if any
    pub fn bundled_path(kind: ToolKind) -> Option<PathBuf> {
        let exe = std::env::current_exe().ok()?;
        let dir = exe.parent()?;
        Some(dir.join("ffmpeg").join(format!(
            "{}{}",
            kind.executable_name(),
            std::env::consts::EXE_SUFFIX
        )))
    }

    /// Resolve the executable to launch for `kind`
    pub fn resolve(&self, kind: ToolKind) -> Result<PathBuf, DomainError> {
        if let Some(path) = self.configured(kind) {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            // A bare name such as "ffmpeg-6" is looked up on PATH
            return which::which(path).map_err(|_| {
                DomainError::ToolNotFound(format!(
                    "{} (configured as {})",
                    kind,
                    path.display()
                ))
            });
        }

        if let Some(bundled) = Self::bundled_path(kind).filter(|p| p.is_file()) {
            debug!("Using bundled {} at {}", kind, bundled.display());
            return Ok(bundled);
        }

        which::which(kind.executable_name())
            .map_err(|e| DomainError::ToolNotFound(format!("{} is not on PATH: {}", kind, e)))
    }
}

/// Process-backed implementation of [`CommandPort`]
pub struct FFmpegAdapter {
    locator: ToolLocator,
    grace: Duration,
}

#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

enum Interrupt {
    TimedOut,
    Cancelled,
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter
    pub fn new(locator: ToolLocator) -> Self {
        Self {
            locator,
            grace: DEFAULT_TERMINATION_GRACE,
        }
    }

    /// Override the termination grace period
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Ask the process to stop, then kill it if it outlives the grace period
    async fn terminate(&self, child: &mut Child) {
        #[cfg(unix)]
        if let Some(pid) = child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                Ok(()) => match tokio::time::timeout(self.grace, child.wait()).await {
                    Ok(Ok(status)) => {
                        debug!("Process {} exited after SIGTERM with {}", pid, status);
                        return;
                    }
                    Ok(Err(e)) => warn!("Waiting for process {} failed: {}", pid, e),
                    Err(_) => warn!(
                        "Process {} ignored SIGTERM for {:?}, killing",
                        pid, self.grace
                    ),
                },
                Err(e) => warn!("Failed to send SIGTERM to process {}: {}", pid, e),
            }
        }

        if let Err(e) = child.kill().await {
            warn!("Failed to kill child process: {}", e);
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> String {
    let mut buffer = Vec::new();
    if let Some(mut reader) = reader {
        if let Err(e) = reader.read_to_end(&mut buffer).await {
            debug!("Stopped reading child output: {}", e);
        }
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[async_trait]
impl CommandPort for FFmpegAdapter {
    async fn run(
        &self,
        args: &[String],
        kind: ToolKind,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DomainError> {
        let program = self.locator.resolve(kind)?;
        if cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }

        debug!("Running {} {}", program.display(), args.join(" "));
        let mut command = Command::new(&program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // A terminal Ctrl+C must reach only us; the token stops the child
        #[cfg(unix)]
        command.process_group(0);
        #[cfg(windows)]
        command.creation_flags(CREATE_NEW_PROCESS_GROUP);

        let mut child = command
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    DomainError::ToolNotFound(format!("{} ({})", kind, program.display()))
                }
                _ => DomainError::Io(e),
            })?;

        // Both pipes are drained concurrently so a chatty process never
        // blocks on a full buffer.
        let stdout_task = tokio::spawn(drain(child.stdout.take()));
        let stderr_task = tokio::spawn(drain(child.stderr.take()));

        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        let waited = tokio::select! {
            status = child.wait() => Ok(status),
            _ = deadline => Err(Interrupt::TimedOut),
            _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        };

        match waited {
            Ok(status) => {
                let status = status?;
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                let exit_code = status.code().unwrap_or(-1);
                debug!("{} exited with code {}", kind, exit_code);
                Ok(RunOutcome::Exited(ProcessOutput {
                    exit_code,
                    stdout,
                    stderr,
                }))
            }
            Err(interrupt) => {
                match interrupt {
                    Interrupt::TimedOut => warn!(
                        "{} exceeded its timeout of {:?}, terminating",
                        kind,
                        timeout.unwrap_or_default()
                    ),
                    Interrupt::Cancelled => info!("Cancellation requested, terminating {}", kind),
                }
                self.terminate(&mut child).await;
                // Grandchildren may still hold the pipes open
                stdout_task.abort();
                stderr_task.abort();
                Ok(match interrupt {
                    Interrupt::TimedOut => RunOutcome::TimedOut,
                    Interrupt::Cancelled => RunOutcome::Cancelled,
                })
            }
        }
    }
}
