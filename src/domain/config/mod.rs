//! Configuration domain module

mod app_config;

pub use app_config::{is_valid_log_level, AppConfig, DEFAULT_LOG_LEVEL, VALID_LOG_LEVELS};
