//! Container encoders

mod flac_encoder;
mod wav_encoder;

pub use flac_encoder::FlacEncoder;
pub use wav_encoder::WavEncoder;

use crate::application::ports::Encoder;
use crate::domain::encoding::AudioMimeType;

/// Build the encoder for `mime_type`
pub fn create_encoder(mime_type: AudioMimeType) -> Box<dyn Encoder> {
    match mime_type {
        AudioMimeType::Wav => Box::new(WavEncoder::new()),
        AudioMimeType::Flac => Box::new(FlacEncoder::new()),
    }
}
