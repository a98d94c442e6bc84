// Tracing log adapter - Structured logging using tracing crate

use tracing_subscriber::EnvFilter;

use crate::domain::errors::*;

/// Accepted log levels
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Build the filter: RUST_LOG wins over the configured level
pub fn build_filter(level: &str) -> Result<EnvFilter, DomainError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = level.trim().to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(DomainError::ConfigError(format!(
            "Invalid log level: {}. Valid levels: {}",
            level,
            LOG_LEVELS.join(", ")
        )));
    }
    EnvFilter::try_new(&level)
        .map_err(|e| DomainError::ConfigError(format!("Invalid log filter: {}", e)))
}

/// Install the global subscriber, writing to stderr.
///
/// Stdout is left to progress output and the JSON report. Calling this twice
/// keeps the first subscriber.
pub fn init_logging(level: &str, json: bool) -> Result<(), DomainError> {
    let filter = build_filter(level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_rejects_unknown_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(build_filter("debug").is_ok());
        assert!(build_filter(" WARN ").is_ok());
        assert!(matches!(
            build_filter("chatty"),
            Err(DomainError::ConfigError(_))
        ));
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        assert!(init_logging("info", false).is_ok());
        assert!(init_logging("info", true).is_ok());
    }
}
