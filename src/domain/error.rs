//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>ms, <number>s, <number>m, or <number>m<number>s (e.g., 500ms, 30s, 1m, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when an unknown container format is requested
#[derive(Debug, Clone, Error)]
#[error("Unsupported audio format: \"{input}\". Supported formats are: wav, flac")]
pub struct UnsupportedFormatError {
    pub input: String,
}

/// Errors raised while turning PCM samples into a container.
///
/// These signal a broken contract with the capture side, never a
/// recoverable condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("Sample {index} of chunk is not a number")]
    NonNumericSample { index: usize },

    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(u32),

    #[error("Sample rate {rate} Hz exceeds the {max} Hz this format allows")]
    SampleRateTooHigh { rate: u32, max: u32 },

    #[error("Data section of {bytes} bytes does not fit a 32-bit container length")]
    ContainerTooLarge { bytes: u64 },

    #[error("Encoder backend failed: {0}")]
    Backend(String),

    #[error("Encoder worker is no longer running")]
    WorkerGone,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
