//! XDG config store adapter

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Directory name under the platform config dir
const APP_DIR: &str = "wave-recorder";

/// TOML config file under the platform config directory
pub struct XdgConfigStore {
    path: PathBuf,
}

impl XdgConfigStore {
    /// Create a store at `<config dir>/wave-recorder/config.toml`
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join(APP_DIR);

        Self {
            path: config_dir.join("config.toml"),
        }
    }

    /// Create with custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse_toml(content: &str) -> Result<AppConfig, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn to_toml(config: &AppConfig) -> Result<String, ConfigError> {
        toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.exists() {
            tracing::debug!("No config at {}", self.path.display());
            return Ok(AppConfig::empty());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Self::parse_toml(&content)
    }

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let content = Self::to_toml(config)?;

        fs::write(&self.path, content)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        tracing::debug!("Saved config to {}", self.path.display());
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_is_under_app_dir() {
        let path = XdgConfigStore::new().path();
        assert!(path.to_string_lossy().contains("wave-recorder"));
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn parse_toml_flat_format() {
        let content = r#"
timeslice = "1s"
format = "flac"
prefix = "take"
"#;

        let config = XdgConfigStore::parse_toml(content).unwrap();
        assert_eq!(config.timeslice, Some("1s".to_string()));
        assert_eq!(config.format, Some("flac".to_string()));
        assert_eq!(config.prefix, Some("take".to_string()));
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn parse_toml_rejects_garbage() {
        assert!(matches!(
            XdgConfigStore::parse_toml("timeslice = [1, 2"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("absent.toml"));

        assert!(!store.exists());
        assert_eq!(store.load().await.unwrap(), AppConfig::empty());
    }

    #[tokio::test]
    async fn save_then_load_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("nested/dir/config.toml"));
        let config = AppConfig {
            duration: Some("2m30s".to_string()),
            output_dir: Some("/tmp/takes".to_string()),
            ..Default::default()
        };

        store.save(&config).await.unwrap();

        assert!(store.exists());
        assert_eq!(store.load().await.unwrap(), config);
    }

    #[tokio::test]
    async fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));

        store.init().await.unwrap();
        assert_eq!(store.load().await.unwrap(), AppConfig::defaults());
        assert!(matches!(store.init().await, Err(ConfigError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn unreadable_config_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        let store = XdgConfigStore::with_path(path);
        assert_eq!(store.load_or_empty().await, AppConfig::empty());
    }
}
