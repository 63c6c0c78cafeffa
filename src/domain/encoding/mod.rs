//! Encoding domain module
//!
//! Pure sample conversion and container layout. Nothing here owns a
//! thread or a channel; the encoder adapters build on these functions.

mod audio_data;
pub mod pcm;
pub mod wav;

pub use audio_data::{AudioData, AudioMimeType};
pub use wav::WavSpec;
