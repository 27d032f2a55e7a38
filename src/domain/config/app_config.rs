//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::recorder::MaxDuration;

/// Log level used when neither RUST_LOG nor the config sets one
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Accepted log levels
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Maximum recording duration in seconds
    pub max_duration: Option<u32>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            max_duration: Some(MaxDuration::default_duration().as_secs()),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            max_duration: other.max_duration.or(self.max_duration),
            log_level: other.log_level.or(self.log_level),
        }
    }

    /// Get max_duration as a clamped MaxDuration, or the default if not set
    pub fn max_duration_or_default(&self) -> MaxDuration {
        self.max_duration
            .map(MaxDuration::from_secs)
            .unwrap_or_default()
    }

    /// Get log level, or "warn" if not set
    pub fn log_level_or_default(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

/// Check if a log level string is accepted
pub fn is_valid_log_level(level: &str) -> bool {
    VALID_LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.max_duration, Some(10));
        assert_eq!(config.log_level, Some("warn".to_string()));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.max_duration.is_none());
        assert!(config.log_level.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            max_duration: Some(10),
            log_level: Some("warn".to_string()),
        };
        let other = AppConfig {
            max_duration: Some(30),
            log_level: None,
        };

        let merged = base.merge(other);
        assert_eq!(merged.max_duration, Some(30));
        assert_eq!(merged.log_level, Some("warn".to_string()));
    }

    #[test]
    fn max_duration_or_default() {
        assert_eq!(AppConfig::empty().max_duration_or_default().as_secs(), 10);

        let config = AppConfig {
            max_duration: Some(900),
            ..Default::default()
        };
        assert_eq!(config.max_duration_or_default().as_secs(), 600);
    }

    #[test]
    fn log_level_or_default() {
        assert_eq!(AppConfig::empty().log_level_or_default(), "warn");
    }

    #[test]
    fn log_level_validation() {
        assert!(is_valid_log_level("info"));
        assert!(is_valid_log_level("DEBUG"));
        assert!(!is_valid_log_level("loud"));
    }
}
