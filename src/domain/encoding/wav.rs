//! Uncompressed RIFF/WAVE container
//!
//! Layout of the 44-byte header (all integers little-endian):
//!
//! | offset | size | field                               |
//! |--------|------|-------------------------------------|
//! | 0      | 4    | `RIFF`                              |
//! | 4      | 4    | total length - 8                    |
//! | 8      | 4    | `WAVE`                              |
//! | 12     | 4    | `fmt `                              |
//! | 16     | 4    | 16 (fmt chunk length)               |
//! | 20     | 2    | 1 (PCM)                             |
//! | 22     | 2    | channels                            |
//! | 24     | 4    | sample rate                         |
//! | 28     | 4    | byte rate                           |
//! | 32     | 2    | block align                         |
//! | 34     | 2    | bits per sample                     |
//! | 36     | 4    | `data`                              |
//! | 40     | 4    | data length in bytes                |

use crate::domain::encoding::pcm;
use crate::domain::error::EncodeError;

/// Size of the canonical PCM header
pub const HEADER_LEN: usize = 44;

const FMT_CHUNK_LEN: u32 = 16;
const FORMAT_PCM: u16 = 1;

/// Container descriptor for a WAVE file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl WavSpec {
    /// Mono, 16-bit signed PCM at the given rate
    pub fn mono16(sample_rate: u32) -> Result<Self, EncodeError> {
        if sample_rate == 0 {
            return Err(EncodeError::InvalidSampleRate(sample_rate));
        }
        Ok(Self {
            sample_rate,
            channels: 1,
            bits_per_sample: 16,
        })
    }

    /// Bytes per interleaved frame
    pub const fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    /// Bytes per second of audio
    pub const fn byte_rate(&self) -> u32 {
        self.sample_rate.saturating_mul(self.block_align() as u32)
    }

    /// Serialize the header for a data section of `data_len` bytes
    pub fn header(&self, data_len: u32) -> Result<[u8; HEADER_LEN], EncodeError> {
        let riff_len = data_len
            .checked_add((HEADER_LEN - 8) as u32)
            .ok_or(EncodeError::ContainerTooLarge {
                bytes: data_len as u64,
            })?;

        let mut header = [0u8; HEADER_LEN];
        header[0..4].copy_from_slice(b"RIFF");
        header[4..8].copy_from_slice(&riff_len.to_le_bytes());
        header[8..12].copy_from_slice(b"WAVE");
        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
        header[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
        header[22..24].copy_from_slice(&self.channels.to_le_bytes());
        header[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        header[28..32].copy_from_slice(&self.byte_rate().to_le_bytes());
        header[32..34].copy_from_slice(&self.block_align().to_le_bytes());
        header[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        header[36..40].copy_from_slice(b"data");
        header[40..44].copy_from_slice(&data_len.to_le_bytes());
        Ok(header)
    }
}

/// Encode a run of float chunks as one standalone mono 16-bit WAVE file.
pub fn encode_chunks(chunks: &[Vec<f32>], sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
    let spec = WavSpec::mono16(sample_rate)?;

    let sample_count: usize = chunks.iter().map(Vec::len).sum();
    let data_bytes = sample_count as u64 * spec.block_align() as u64;
    let data_len = u32::try_from(data_bytes)
        .ok()
        .filter(|len| len.checked_add((HEADER_LEN - 8) as u32).is_some())
        .ok_or(EncodeError::ContainerTooLarge { bytes: data_bytes })?;

    let mut buf = Vec::with_capacity(HEADER_LEN + data_len as usize);
    buf.extend_from_slice(&spec.header(data_len)?);
    for sample in chunks.iter().flatten() {
        buf.extend_from_slice(&pcm::to_i16(*sample).to_le_bytes());
    }

    Ok(buf)
}
