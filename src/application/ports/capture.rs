//! Capture port interfaces

use thiserror::Error;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No audio input device available")]
    NoAudioDevice,

    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

/// Callback invoked once per captured buffer with mono float samples.
///
/// Called from the capture thread; it must not block for long.
pub type ChunkCallback = Box<dyn FnMut(&[f32]) + Send>;

/// Port for live audio sources
pub trait AudioCapture: Send {
    /// Whether this host offers the capture capability the recorder needs.
    fn host_supported() -> bool
    where
        Self: Sized;

    /// Start delivering chunks to `on_chunk`.
    ///
    /// # Returns
    /// The sample rate of the chunks that will be delivered
    fn open(&mut self, on_chunk: ChunkCallback) -> Result<u32, CaptureError>;

    /// Stop delivering chunks. Must not wait for an in-flight callback.
    fn close(&mut self);
}
