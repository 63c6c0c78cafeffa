//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like cpal, flacenc and the filesystem.

pub mod capture;
pub mod config;
pub mod encoding;
pub mod storage;

// Re-export adapters
pub use capture::CpalCapture;
pub use config::XdgConfigStore;
pub use encoding::{create_encoder, FlacEncoder, WavEncoder};
pub use storage::{SliceWriter, StorageError};
