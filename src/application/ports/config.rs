//! Configuration port interface

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for persisted recorder settings
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read the stored settings. A missing file is an empty config, not an error.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Persist `config`, creating parent directories as needed.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Location of the backing file
    fn path(&self) -> PathBuf;

    /// Whether the backing file exists
    fn exists(&self) -> bool;

    /// Write the default settings. Fails if the file already exists.
    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(
                self.path().to_string_lossy().to_string(),
            ));
        }
        self.save(&AppConfig::defaults()).await
    }

    /// Like `load`, but an unreadable file degrades to an empty config.
    async fn load_or_empty(&self) -> AppConfig {
        match self.load().await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config at {}: {}", self.path().display(), e);
                AppConfig::empty()
            }
        }
    }
}
