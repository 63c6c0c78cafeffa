//! Streaming WAV encoder
//!
//! Keeps appended chunks as they arrived and lays them out behind a fresh
//! 44-byte header on every flush. Each flush is a standalone file covering
//! only the samples appended since the previous one.

use crate::application::ports::Encoder;
use crate::domain::encoding::{pcm, wav, AudioMimeType};
use crate::domain::error::EncodeError;

/// Mono 16-bit PCM WAVE encoder
#[derive(Debug, Default)]
pub struct WavEncoder {
    chunks: Vec<Vec<f32>>,
    pending: usize,
}

impl WavEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Encoder for WavEncoder {
    fn append(&mut self, samples: &[f32]) -> Result<(), EncodeError> {
        pcm::validate(samples)?;
        if samples.is_empty() {
            return Ok(());
        }
        self.pending += samples.len();
        self.chunks.push(samples.to_vec());
        Ok(())
    }

    fn flush(&mut self, sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
        let chunks = std::mem::take(&mut self.chunks);
        self.pending = 0;
        wav::encode_chunks(&chunks, sample_rate)
    }

    fn pending_samples(&self) -> usize {
        self.pending
    }

    fn mime_type(&self) -> AudioMimeType {
        AudioMimeType::Wav
    }
}
