//! Streaming FLAC encoder
//!
//! Lossless alternative to WAV, typically around 40% of the size for
//! speech. Samples are quantized to 16-bit PCM on append, exactly as the
//! WAV path does, so both formats decode to the same values.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;

use crate::application::ports::Encoder;
use crate::domain::encoding::{pcm, AudioMimeType};
use crate::domain::error::EncodeError;

/// Bits per sample (16-bit audio)
const BITS_PER_SAMPLE: usize = 16;

/// Number of channels (mono)
const CHANNELS: usize = 1;

/// Highest rate flacenc accepts in STREAMINFO
pub const MAX_SAMPLE_RATE: u32 = 96_000;

/// Mono 16-bit FLAC encoder
#[derive(Debug, Default)]
pub struct FlacEncoder {
    samples: Vec<i32>,
}

impl FlacEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn encode(samples: &[i32], sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
        let config = config::Encoder::default()
            .into_verified()
            .map_err(|(_, e)| EncodeError::Backend(format!("FLAC config error: {:?}", e)))?;

        let source = MemSource::from_samples(samples, CHANNELS, BITS_PER_SAMPLE, sample_rate as usize);

        let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
            .map_err(|e| EncodeError::Backend(format!("FLAC encoding failed: {:?}", e)))?;

        let mut sink = ByteSink::new();
        stream
            .write(&mut sink)
            .map_err(|e| EncodeError::Backend(format!("FLAC write failed: {}", e)))?;

        Ok(sink.into_inner())
    }
}

impl Encoder for FlacEncoder {
    fn append(&mut self, samples: &[f32]) -> Result<(), EncodeError> {
        pcm::validate(samples)?;
        self.samples
            .extend(samples.iter().map(|&s| i32::from(pcm::to_i16(s))));
        Ok(())
    }

    fn flush(&mut self, sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
        let samples = std::mem::take(&mut self.samples);
        if sample_rate == 0 {
            return Err(EncodeError::InvalidSampleRate(sample_rate));
        }
        if sample_rate > MAX_SAMPLE_RATE {
            return Err(EncodeError::SampleRateTooHigh {
                rate: sample_rate,
                max: MAX_SAMPLE_RATE,
            });
        }
        Self::encode(&samples, sample_rate)
    }

    fn pending_samples(&self) -> usize {
        self.samples.len()
    }

    fn mime_type(&self) -> AudioMimeType {
        AudioMimeType::Flac
    }

    fn max_sample_rate(&self) -> Option<u32> {
        Some(MAX_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_silence() {
        let mut encoder = FlacEncoder::new();
        encoder.append(&vec![0.0; 16000]).unwrap();

        let flac = encoder.flush(16000).unwrap();
        assert!(flac.len() > 50);
        assert_eq!(&flac[0..4], b"fLaC");
        assert_eq!(encoder.pending_samples(), 0);
    }

    #[test]
    fn encode_with_signal_compresses() {
        let samples: Vec<f32> = (0..16000)
            .map(|i| {
                let t = i as f32 / 16000.0;
                f32::sin(2.0 * std::f32::consts::PI * 440.0 * t) * 0.5
            })
            .collect();

        let mut encoder = FlacEncoder::new();
        for chunk in samples.chunks(2048) {
            encoder.append(chunk).unwrap();
        }

        let flac = encoder.flush(16000).unwrap();
        assert_eq!(&flac[0..4], b"fLaC");
        assert!(flac.len() < samples.len() * 2);
    }

    #[test]
    fn rejects_nan_and_zero_rate() {
        let mut encoder = FlacEncoder::new();
        assert!(matches!(
            encoder.append(&[f32::NAN]),
            Err(EncodeError::NonNumericSample { index: 0 })
        ));

        encoder.append(&[0.1; 32]).unwrap();
        assert_eq!(encoder.flush(0), Err(EncodeError::InvalidSampleRate(0)));
        assert_eq!(encoder.pending_samples(), 0);
    }

    #[test]
    fn empty_flush_is_valid_stream() {
        let mut encoder = FlacEncoder::new();

        for _ in 0..2 {
            let flac = encoder.flush(16000).unwrap();
            assert_eq!(&flac[0..4], b"fLaC");
            assert_eq!(encoder.pending_samples(), 0);
        }
    }

    #[test]
    fn rejects_rates_above_limit() {
        let mut encoder = FlacEncoder::new();
        encoder.append(&[0.1; 100]).unwrap();

        assert_eq!(
            encoder.flush(192000),
            Err(EncodeError::SampleRateTooHigh {
                rate: 192000,
                max: MAX_SAMPLE_RATE,
            })
        );
        assert_eq!(encoder.pending_samples(), 0);

        encoder.append(&[0.1; 100]).unwrap();
        assert_eq!(&encoder.flush(MAX_SAMPLE_RATE).unwrap()[0..4], b"fLaC");
    }

    #[test]
    fn reports_flac_mime_type() {
        let encoder = FlacEncoder::new();
        assert_eq!(encoder.mime_type(), AudioMimeType::Flac);
        assert_eq!(encoder.max_sample_rate(), Some(MAX_SAMPLE_RATE));
    }
}
