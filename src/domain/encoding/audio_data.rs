//! Audio data value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::UnsupportedFormatError;

/// Container formats the recorder can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioMimeType {
    #[default]
    Wav,
    Flac,
}

impl AudioMimeType {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Flac => "audio/flac",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Flac => "flac",
        }
    }

    /// Resolve a MIME type string to a supported container.
    ///
    /// Case-insensitive; codec parameters after `;` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "audio/wav" | "audio/wave" | "audio/x-wav" | "audio/vnd.wave" => Some(Self::Wav),
            "audio/flac" | "audio/x-flac" => Some(Self::Flac),
            _ => None,
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AudioMimeType {
    type Err = UnsupportedFormatError;

    /// Accepts a short format name ("wav", "flac") or a MIME type
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wav" | "wave" => Ok(Self::Wav),
            "flac" => Ok(Self::Flac),
            other => Self::from_mime(other).ok_or_else(|| UnsupportedFormatError {
                input: s.to_string(),
            }),
        }
    }
}

/// One emitted container: the payload of a `dataavailable` event.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    data: Vec<u8>,
    mime_type: AudioMimeType,
}

impl AudioData {
    /// Create AudioData from raw bytes
    pub fn new(data: Vec<u8>, mime_type: AudioMimeType) -> Self {
        Self { data, mime_type }
    }

    /// Get the raw container bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the raw container bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Get the MIME type
    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}
