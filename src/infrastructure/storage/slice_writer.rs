//! Writes each delivered blob to its own numbered file

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::domain::encoding::AudioData;

/// Slice storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Names slices `<prefix>-0001.<ext>`, `<prefix>-0002.<ext>`, ...
///
/// Safe to share between listeners; numbering is atomic.
#[derive(Debug)]
pub struct SliceWriter {
    dir: PathBuf,
    prefix: String,
    next: AtomicU32,
}

impl SliceWriter {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            next: AtomicU32::new(1),
        }
    }

    /// Directory slices are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of slices written so far
    pub fn written(&self) -> u32 {
        self.next.load(Ordering::SeqCst) - 1
    }

    /// Write `data` to the next numbered file and return its path.
    pub fn write(&self, data: &AudioData) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let index = self.next.fetch_add(1, Ordering::SeqCst);
        let path = self.path_for(index, data.mime_type().extension());

        fs::write(&path, data.data()).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::info!("Wrote {} to {}", data.human_readable_size(), path.display());
        Ok(path)
    }

    fn path_for(&self, index: u32, extension: &str) -> PathBuf {
        self.dir
            .join(format!("{}-{:04}.{}", self.prefix, index, extension))
    }
}
