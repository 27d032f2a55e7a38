//! Configuration port interface

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for configuration storage
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load configuration from storage.
    /// A missing file yields an empty config.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Save configuration to storage.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Get the configuration file path.
    fn path(&self) -> PathBuf;

    /// Check if configuration file exists.
    fn exists(&self) -> bool;

    /// Initialize configuration file with defaults.
    /// Fails if file already exists.
    async fn init(&self) -> Result<(), ConfigError>;

    /// Resolve the effective config: defaults < stored file < overrides.
    ///
    /// An unreadable file is treated as empty so a broken config never
    /// blocks recording.
    async fn resolve(&self, overrides: AppConfig) -> AppConfig {
        let stored = self.load().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, path = %self.path().display(), "Ignoring unreadable config");
            AppConfig::empty()
        });
        AppConfig::defaults().merge(stored).merge(overrides)
    }
}
