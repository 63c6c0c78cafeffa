//! Encoder port interface

use crate::domain::encoding::AudioMimeType;
use crate::domain::error::EncodeError;

/// Port for streaming container encoders.
///
/// An encoder accumulates PCM chunks and, on `flush`, serializes everything
/// appended since the previous flush into one complete, standalone container.
/// Implementations run on the encoder worker thread and are never shared.
pub trait Encoder: Send {
    /// Append one mono chunk of float samples to the accumulation buffer.
    ///
    /// Values outside [-1.0, 1.0] are accepted; they saturate at serialization.
    fn append(&mut self, samples: &[f32]) -> Result<(), EncodeError>;

    /// Serialize the accumulated samples and clear the buffer.
    ///
    /// Flushing an empty buffer yields a valid container with no audio.
    fn flush(&mut self, sample_rate: u32) -> Result<Vec<u8>, EncodeError>;

    /// Number of samples waiting for the next flush
    fn pending_samples(&self) -> usize;

    /// Format of the containers this encoder produces
    fn mime_type(&self) -> AudioMimeType;

    /// Highest sample rate `flush` accepts, if the format has one
    fn max_sample_rate(&self) -> Option<u32> {
        None
    }
}

impl<E: Encoder + ?Sized> Encoder for Box<E> {
    fn append(&mut self, samples: &[f32]) -> Result<(), EncodeError> {
        (**self).append(samples)
    }

    fn flush(&mut self, sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
        (**self).flush(sample_rate)
    }

    fn pending_samples(&self) -> usize {
        (**self).pending_samples()
    }

    fn mime_type(&self) -> AudioMimeType {
        (**self).mime_type()
    }

    fn max_sample_rate(&self) -> Option<u32> {
        (**self).max_sample_rate()
    }
}
