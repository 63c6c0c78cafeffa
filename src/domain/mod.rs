//! Domain layer - Core recording logic
//!
//! Contains the recorder state machine, events, PCM conversion, the WAV
//! container layout, value objects and domain errors.
//! This layer has no dependencies on threads, channels or devices.

pub mod config;
pub mod encoding;
pub mod error;
pub mod recorder;
pub mod recording;

// Re-export common types
pub use config::AppConfig;
pub use encoding::{AudioData, AudioMimeType};
pub use error::*;
pub use recorder::{EventKind, RecorderEvent, RecorderState};
pub use recording::Duration;
