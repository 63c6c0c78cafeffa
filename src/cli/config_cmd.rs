//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::encoding::AudioMimeType;
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    validate_config_value(key, value)?;

    let mut config = store.load().await?;
    *field_mut(&mut config, key) = Some(value.to_string());

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let mut config = store.load().await?;
    match field_mut(&mut config, key).as_deref() {
        Some(v) => presenter.output(v),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let mut config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = field_mut(&mut config, key).clone();
        presenter.key_value(key, value.as_deref().unwrap_or(NOT_SET));
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

/// Slot backing `key`. Keys are checked before this is called.
fn field_mut<'a>(config: &'a mut AppConfig, key: &str) -> &'a mut Option<String> {
    match key {
        "timeslice" => &mut config.timeslice,
        "duration" => &mut config.duration,
        "format" => &mut config.format,
        "output_dir" => &mut config.output_dir,
        _ => &mut config.prefix,
    }
}

/// Validate a config value based on key type
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "timeslice" | "duration" => {
            value.parse::<Duration>().map_err(|e| invalid(e.to_string()))?;
        }
        "format" => {
            value
                .parse::<AudioMimeType>()
                .map_err(|e| invalid(e.to_string()))?;
        }
        "output_dir" if value.trim().is_empty() => {
            return Err(invalid("Value must not be empty".to_string()));
        }
        "prefix" => {
            if value.is_empty() || value.contains(['/', '\\']) {
                return Err(invalid(
                    "Value must be a non-empty file name without path separators".to_string(),
                ));
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::XdgConfigStore;

    #[test]
    fn validates_durations() {
        assert!(validate_config_value("timeslice", "250ms").is_ok());
        assert!(validate_config_value("duration", "1m").is_ok());
        assert!(validate_config_value("duration", "forever").is_err());
    }

    #[test]
    fn validates_format() {
        assert!(validate_config_value("format", "flac").is_ok());
        assert!(validate_config_value("format", "audio/wav").is_ok());
        assert!(validate_config_value("format", "mp3").is_err());
    }

    #[test]
    fn validates_prefix() {
        assert!(validate_config_value("prefix", "take").is_ok());
        assert!(validate_config_value("prefix", "").is_err());
        assert!(validate_config_value("prefix", "a/b").is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(matches!(
            check_key("api_key"),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[tokio::test]
    async fn set_persists_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        let presenter = Presenter::new();

        handle_set(&store, &presenter, "timeslice", "2s").await.unwrap();
        handle_set(&store, &presenter, "prefix", "take").await.unwrap();

        let config = store.load().await.unwrap();
        assert_eq!(config.timeslice, Some("2s".to_string()));
        assert_eq!(config.prefix, Some("take".to_string()));
    }

    #[tokio::test]
    async fn invalid_set_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        let presenter = Presenter::new();

        assert!(handle_set(&store, &presenter, "format", "ogg").await.is_err());
        assert!(!store.exists());
    }
}
