//! Structured logging setup
//!
//! Logs go to stderr so they never mix with node JSON written to stdout.
//! `RUST_LOG` takes precedence; otherwise the configured level applies.

use thiserror::Error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Logging setup errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{0}'")]
    InvalidFilter(String),

    #[error("Logging already initialized")]
    AlreadyInitialized,
}

/// Build the filter from `RUST_LOG`, falling back to `default_level`
pub fn env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_level)
            .map_err(|_| LoggingError::InvalidFilter(default_level.to_string())),
    }
}

/// Install the global stderr subscriber
pub fn init_logging(default_level: &str) -> Result<(), LoggingError> {
    let filter = env_filter(default_level)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    tracing::debug!(default_level, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_levels() {
        assert!(EnvFilter::try_new("debug").is_ok());
        assert!(EnvFilter::try_new("recorder_node=trace,warn").is_ok());
    }

    #[test]
    fn second_init_fails() {
        let _ = init_logging("warn");
        assert!(matches!(
            init_logging("warn"),
            Err(LoggingError::AlreadyInitialized)
        ));
    }
}
