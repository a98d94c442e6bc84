//! Hardware encoder catalog adapters

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::DiagnosticExtractor;
use crate::ports::*;

/// Budget for listing the encoders ffmpeg was built with
pub const DETECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Catalog built from configuration or detection results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticEncoderCatalog {
    encoders: Vec<EncoderId>,
    verified: bool,
}

impl StaticEncoderCatalog {
    /// Catalog of exactly these families
    pub fn new(encoders: Vec<EncoderId>) -> Self {
        Self {
            encoders,
            verified: true,
        }
    }

    /// Catalog that trusts every family; failures are caught by the
    /// software fallback at encode time
    pub fn unverified() -> Self {
        Self {
            encoders: EncoderId::ALL.to_vec(),
            verified: false,
        }
    }

    /// From the `available_encoders` setting, unset meaning unverified
    pub fn from_config(available: Option<Vec<EncoderId>>) -> Self {
        match available {
            Some(encoders) => Self::new(encoders),
            None => Self::unverified(),
        }
    }

    /// Whether the list reflects this machine rather than a blanket trust
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// Ask ffmpeg which H.264 hardware encoders it was built with.
    ///
    /// A build listing an encoder can still fail at runtime without the
    /// matching GPU and driver.
    pub async fn detect(
        runner: &dyn CommandPort,
        cancel: &CancellationToken,
    ) -> Result<Self, DomainError> {
        let args: Vec<String> = ["-hide_banner", "-encoders"].map(String::from).to_vec();
        let outcome = runner
            .run(&args, ToolKind::Transcoder, Some(DETECT_TIMEOUT), cancel)
            .await?;
        match outcome {
            RunOutcome::Exited(output) if output.success() => {
                let encoders = Self::parse_encoder_list(&output.stdout);
                debug!("ffmpeg lists hardware encoders: {:?}", encoders);
                Ok(Self::new(encoders))
            }
            RunOutcome::Exited(output) => {
                warn!("ffmpeg -encoders exited with code {}", output.exit_code);
                Err(DomainError::ToolExecutionFailed {
                    tool: ToolKind::Transcoder.to_string(),
                    exit_code: output.exit_code,
                    message: DiagnosticExtractor::failure_reason(ToolKind::Transcoder, &output),
                })
            }
            RunOutcome::TimedOut => Err(DomainError::TimedOut {
                tool: ToolKind::Transcoder.to_string(),
                seconds: DETECT_TIMEOUT.as_secs(),
            }),
            RunOutcome::Cancelled => Ok(Self::new(Vec::new())),
        }
    }

    /// Families whose codec name appears as an encoder in `ffmpeg -encoders`
    pub fn parse_encoder_list(stdout: &str) -> Vec<EncoderId> {
        EncoderId::ALL
            .into_iter()
            .filter(|id| {
                stdout.lines().any(|line| {
                    line.split_whitespace().nth(1) == Some(id.codec_name())
                })
            })
            .collect()
    }
}

impl EncoderCatalogPort for StaticEncoderCatalog {
    fn available_encoders(&self) -> Vec<(String, EncoderId)> {
        self.encoders
            .iter()
            .map(|id| (id.display_name().to_string(), *id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every call with one fixed outcome
    struct FixedRunner {
        outcome: RunOutcome,
        timeouts: Mutex<Vec<Option<Duration>>>,
    }

    impl FixedRunner {
        fn new(outcome: RunOutcome) -> Self {
            Self {
                outcome,
                timeouts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandPort for FixedRunner {
        async fn run(
            &self,
            _args: &[String],
            _kind: ToolKind,
            timeout: Option<Duration>,
            _cancel: &CancellationToken,
        ) -> Result<RunOutcome, DomainError> {
            self.timeouts.lock().unwrap().push(timeout);
            Ok(self.outcome.clone())
        }
    }

    fn exited(code: i32, stdout: &str, stderr: &str) -> RunOutcome {
        RunOutcome::Exited(ProcessOutput {
            exit_code: code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        })
    }

    const ENCODERS_OUTPUT: &str = "Encoders:
 V..... = Video
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)
 V..... h264_qsv             H.264 (Intel Quick Sync Video acceleration) (codec h264)
 A....D aac                  AAC (Advanced Audio Coding)
";

    #[test]
    fn test_parse_encoder_list() {
        assert_eq!(
            StaticEncoderCatalog::parse_encoder_list(ENCODERS_OUTPUT),
            vec![EncoderId::Nvenc, EncoderId::Qsv]
        );
        assert!(StaticEncoderCatalog::parse_encoder_list("").is_empty());
    }

    #[test]
    fn test_catalog_display_names() {
        let catalog = StaticEncoderCatalog::new(vec![EncoderId::Amf]);
        assert_eq!(
            catalog.available_encoders(),
            vec![("AMD AMF".to_string(), EncoderId::Amf)]
        );
        assert!(catalog.is_any_available());
        assert!(catalog.is_available(EncoderId::Amf));
        assert!(!catalog.is_available(EncoderId::Nvenc));
    }

    #[test]
    fn test_from_config() {
        let empty = StaticEncoderCatalog::from_config(Some(Vec::new()));
        assert!(!empty.is_any_available());
        assert!(empty.is_verified());

        let trusted = StaticEncoderCatalog::from_config(None);
        assert!(!trusted.is_verified());
        assert!(EncoderId::ALL.iter().all(|id| trusted.is_available(*id)));
    }

    #[tokio::test]
    async fn test_detect_parses_listing_within_budget() {
        let runner = FixedRunner::new(exited(0, ENCODERS_OUTPUT, ""));
        let catalog = StaticEncoderCatalog::detect(&runner, &CancellationToken::new())
            .await
            .unwrap();
        assert!(catalog.is_verified());
        assert!(catalog.is_available(EncoderId::Qsv));
        assert!(!catalog.is_available(EncoderId::Amf));
        assert_eq!(*runner.timeouts.lock().unwrap(), vec![Some(DETECT_TIMEOUT)]);
    }

    #[tokio::test]
    async fn test_detect_reports_tool_failure() {
        let runner = FixedRunner::new(exited(
            1,
            "",
            "Unrecognized option 'encoders'.\nError splitting the argument list",
        ));
        let result = StaticEncoderCatalog::detect(&runner, &CancellationToken::new()).await;
        match result {
            Err(DomainError::ToolExecutionFailed { exit_code, message, .. }) => {
                assert_eq!(exit_code, 1);
                assert_eq!(message, "Error splitting the argument list");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_detect_reports_timeout() {
        let runner = FixedRunner::new(RunOutcome::TimedOut);
        let result = StaticEncoderCatalog::detect(&runner, &CancellationToken::new()).await;
        assert!(matches!(
            result,
            Err(DomainError::TimedOut { seconds: 30, .. })
        ));
    }
}
