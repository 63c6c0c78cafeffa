//! Application configuration value object

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::encoding::AudioMimeType;
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

/// Default file name prefix for emitted slices
pub const DEFAULT_PREFIX: &str = "recording";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Interval between automatic flushes (e.g. "1s"); unset means one blob at stop
    pub timeslice: Option<String>,
    /// Stop automatically after this long; unset means record until told to stop
    pub duration: Option<String>,
    /// Container format: "wav" or "flac"
    pub format: Option<String>,
    /// Directory slices are written to
    pub output_dir: Option<String>,
    /// File name prefix for slices
    pub prefix: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            timeslice: None,
            duration: None,
            format: Some("wav".to_string()),
            output_dir: Some(".".to_string()),
            prefix: Some(DEFAULT_PREFIX.to_string()),
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
            timeslice: other.timeslice.or(self.timeslice),
            duration: other.duration.or(self.duration),
            format: other.format.or(self.format),
            output_dir: other.output_dir.or(self.output_dir),
            prefix: other.prefix.or(self.prefix),
        }
    }

    /// Parsed timeslice; unset means a single blob at stop
    pub fn parsed_timeslice(&self) -> Result<Option<Duration>, ConfigError> {
        parse_field("timeslice", self.timeslice.as_deref())
    }

    /// Parsed recording limit; unset means record until told to stop
    pub fn parsed_duration(&self) -> Result<Option<Duration>, ConfigError> {
        parse_field("duration", self.duration.as_deref())
    }

    /// Parsed container format, WAV if not set
    pub fn parsed_format(&self) -> Result<AudioMimeType, ConfigError> {
        Ok(parse_field("format", self.format.as_deref())?.unwrap_or_default())
    }

    /// Get output directory, or the working directory if not set
    pub fn output_dir_or_default(&self) -> PathBuf {
        self.output_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get file prefix, or "recording" if not set
    pub fn prefix_or_default(&self) -> &str {
        self.prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
    }
}

fn parse_field<T>(key: &str, value: Option<&str>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .map(|s| {
            s.parse().map_err(|e: T::Err| ConfigError::ValidationError {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert!(config.timeslice.is_none());
        assert!(config.duration.is_none());
        assert_eq!(config.format, Some("wav".to_string()));
        assert_eq!(config.output_dir, Some(".".to_string()));
        assert_eq!(config.prefix_or_default(), "recording");
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.timeslice.is_none());
        assert!(config.duration.is_none());
        assert!(config.format.is_none());
        assert!(config.output_dir.is_none());
        assert!(config.prefix.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            timeslice: Some("1s".to_string()),
            format: Some("wav".to_string()),
            prefix: Some("base".to_string()),
            ..Default::default()
        };

        let other = AppConfig {
            timeslice: None, // Should not override
            format: Some("flac".to_string()),
            prefix: Some("other".to_string()),
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.timeslice, Some("1s".to_string())); // Kept from base
        assert_eq!(merged.format, Some("flac".to_string()));
        assert_eq!(merged.prefix, Some("other".to_string()));
    }

    #[test]
    fn timeslice_parses_when_set() {
        let config = AppConfig {
            timeslice: Some("500ms".to_string()),
            ..Default::default()
        };
        assert_eq!(config.parsed_timeslice().unwrap(), Some(Duration::from_millis(500)));
        assert_eq!(AppConfig::empty().parsed_timeslice().unwrap(), None);
    }

    #[test]
    fn invalid_timeslice_names_the_key() {
        let config = AppConfig {
            timeslice: Some("often".to_string()),
            ..Default::default()
        };
        match config.parsed_timeslice() {
            Err(ConfigError::ValidationError { key, .. }) => assert_eq!(key, "timeslice"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn duration_parses() {
        let config = AppConfig {
            duration: Some("2m".to_string()),
            ..Default::default()
        };
        assert_eq!(config.parsed_duration().unwrap().map(|d| d.as_secs()), Some(120));
        assert_eq!(AppConfig::empty().parsed_duration().unwrap(), None);
    }

    #[test]
    fn format_defaults_to_wav_and_rejects_unknown() {
        assert_eq!(AppConfig::empty().parsed_format().unwrap(), AudioMimeType::Wav);

        let config = AppConfig {
            format: Some("flac".to_string()),
            ..Default::default()
        };
        assert_eq!(config.parsed_format().unwrap(), AudioMimeType::Flac);

        let config = AppConfig {
            format: Some("ogg".to_string()),
            ..Default::default()
        };
        assert!(config.parsed_format().is_err());
    }

    #[test]
    fn output_dir_or_default_is_cwd() {
        assert_eq!(AppConfig::empty().output_dir_or_default(), PathBuf::from("."));
    }
}
