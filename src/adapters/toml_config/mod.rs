// TOML config adapter - Configuration management using TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapters::tracing_log::LOG_LEVELS;
use crate::domain::errors::*;
use crate::domain::model::*;

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "bulkclip.toml";

/// Default budget for the final concatenation, in seconds
pub const DEFAULT_CONCAT_TIMEOUT_SECS: u64 = 600;

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub tools: ToolsConfig,
    pub encoding: EncodingConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

/// `[tools]` explicit executable paths
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
}

/// `[encoding]` encoder and scratch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub lossless: bool,
    pub hw_encoder: Option<EncoderId>,
    /// Master switch for hardware encoding
    pub hw_acceleration: bool,
    /// Encoders known to work on this machine; unset trusts the request
    pub available_encoders: Option<Vec<EncoderId>>,
    pub concat_timeout_secs: u64,
    pub scratch_dir: Option<PathBuf>,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            lossless: false,
            hw_encoder: None,
            hw_acceleration: true,
            available_encoders: None,
            concat_timeout_secs: DEFAULT_CONCAT_TIMEOUT_SECS,
            scratch_dir: None,
        }
    }
}

impl EncodingConfig {
    pub fn concat_timeout(&self) -> Duration {
        Duration::from_secs(self.concat_timeout_secs)
    }
}

/// `[batch]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub on_failure: FailurePolicy,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Check values serde cannot
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.encoding.concat_timeout_secs == 0 {
            return Err(DomainError::ConfigError(
                "encoding.concat_timeout_secs must be greater than 0".to_string(),
            ));
        }
        let level = self.logging.level.trim().to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(DomainError::ConfigError(format!(
                "Invalid logging.level: {}",
                self.logging.level
            )));
        }
        Ok(())
    }
}

/// TOML configuration loader
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<AppConfig, DomainError> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| DomainError::ConfigError(format!("Failed to parse TOML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a specific file
    pub fn load_file(path: &Path) -> Result<AppConfig, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Default lookup locations in priority order
    pub fn candidate_paths(
        cwd: &Path,
        xdg_config_home: Option<PathBuf>,
        appdata: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> Vec<PathBuf> {
        let mut paths = vec![cwd.join(LOCAL_CONFIG_FILE)];
        let config_root = xdg_config_home
            .or(appdata)
            .or_else(|| home.map(|h| h.join(".config")));
        if let Some(root) = config_root {
            paths.push(root.join("bulkclip").join("config.toml"));
        }
        paths
    }

    fn default_paths() -> Vec<PathBuf> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::candidate_paths(
            &cwd,
            std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            std::env::var_os("APPDATA").map(PathBuf::from),
            std::env::var_os("HOME").map(PathBuf::from),
        )
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise the first existing default
    /// location is used, and built-in defaults when none exists.
    pub fn load(explicit: Option<&Path>) -> Result<(AppConfig, Option<PathBuf>), DomainError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(DomainError::ConfigError(format!(
                    "Config file does not exist: {}",
                    path.display()
                )));
            }
            info!("Loading configuration from {}", path.display());
            return Ok((Self::load_file(path)?, Some(path.to_path_buf())));
        }

        for candidate in Self::default_paths() {
            if candidate.is_file() {
                info!("Loading configuration from {}", candidate.display());
                let config = Self::load_file(&candidate)?;
                return Ok((config, Some(candidate)));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok((AppConfig::default(), None))
    }
}
