//! Application layer - Use cases and port interfaces
//!
//! Contains the recorder use case, the encoder worker and event bus it
//! drives, and trait definitions for external system interactions.

pub mod encoder_worker;
pub mod events;
pub mod ports;
pub mod recorder;

// Re-export use cases
pub use encoder_worker::{EncoderRequest, EncoderResponse, EncoderWorker};
pub use events::{EventBus, EventHandler, ListenerId};
pub use recorder::{MediaRecorder, RecorderError};
