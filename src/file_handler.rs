//! Line-indexed file access with change detection.
//!
//! This module provides the core of logview: a [`FileLoader`] that indexes a file's
//! line boundaries once, serves arbitrary windows of lines by seeking to the indexed
//! offsets, and re-indexes when the file's modification time moves forward.
//!
//! Files below [`DEFAULT_MMAP_THRESHOLD`] are read into a buffer for indexing; larger
//! files are memory-mapped for the duration of the scan. Callers never see the
//! difference beyond [`FileLoader::strategy`].

pub mod line_index;
pub mod loader;
pub mod source;
pub mod validation;

pub use line_index::LineIndex;
pub use loader::{FileLoader, TIMESTAMP_FORMAT};
pub use source::{AccessStrategy, DEFAULT_MMAP_THRESHOLD};
pub use validation::validate_file_path;
