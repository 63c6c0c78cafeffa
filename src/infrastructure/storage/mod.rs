//! Output storage adapters

mod slice_writer;

pub use slice_writer::{SliceWriter, StorageError};
