//! Byte sources used while building a line index
//!
//! A file is either read fully into a buffer or memory-mapped read-only, depending
//! on its size. The source only lives for the duration of an index build; nothing
//! here holds a file handle or a mapping past that call.

use crate::error::{LogviewError, Result};
use memmap2::Mmap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Files at or above this size are memory-mapped instead of read into a buffer
pub const DEFAULT_MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

/// How the bytes for the last index build were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStrategy {
    /// Entire file read into memory
    Buffered,
    /// File mapped read-only and scanned in place
    MemoryMapped,
}

impl fmt::Display for AccessStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessStrategy::Buffered => write!(f, "buffered"),
            AccessStrategy::MemoryMapped => write!(f, "memory-mapped"),
        }
    }
}

/// Internal byte source strategy
#[derive(Debug)]
pub enum ByteSource {
    /// Content loaded entirely into memory (files below the threshold)
    Buffered(Vec<u8>),
    /// Content accessed via memory mapping (files at or above the threshold)
    MemoryMapped(Mmap),
}

impl ByteSource {
    /// Obtain the bytes of `file` using the strategy appropriate for `size`
    ///
    /// # Arguments
    /// * `file` - Open handle to the file being indexed
    /// * `size` - File size from the metadata of that handle
    /// * `threshold` - Size at which memory mapping is preferred
    /// * `path` - Used for diagnostics only
    ///
    /// # Fallback
    /// A failed mapping is never fatal: it is logged as a warning and the file
    /// is read into a buffer instead.
    pub fn load(file: &mut File, size: u64, threshold: u64, path: &Path) -> Result<Self> {
        Self::load_with(file, size, threshold, path, Self::map)
    }

    fn load_with(
        file: &mut File,
        size: u64,
        threshold: u64,
        path: &Path,
        map: impl FnOnce(&File, &Path) -> Result<Mmap>,
    ) -> Result<Self> {
        if size >= threshold {
            match map(&*file, path) {
                Ok(mmap) => return Ok(ByteSource::MemoryMapped(mmap)),
                Err(e) => {
                    log::warn!(
                        "{} ({} bytes): {}; falling back to buffered read",
                        path.display(),
                        size,
                        e
                    );
                }
            }
        }

        Self::read_fully(file, size, path).map(ByteSource::Buffered)
    }

    fn map(file: &File, path: &Path) -> Result<Mmap> {
        // SAFETY: the mapping is read-only and dropped before the index build
        // returns. Concurrent truncation by another process is the documented
        // hazard of file-backed mappings; offsets are only ever derived from it.
        let mmap = unsafe { Mmap::map(file) }.map_err(|e| {
            LogviewError::memory_mapping(format!("cannot map {}: {}", path.display(), e))
        })?;

        #[cfg(unix)]
        {
            // The index build is one forward scan
            if let Err(e) = mmap.advise(memmap2::Advice::Sequential) {
                log::debug!("madvise(sequential) failed for {}: {}", path.display(), e);
            }
        }

        Ok(mmap)
    }

    fn read_fully(file: &mut File, size: u64, path: &Path) -> Result<Vec<u8>> {
        let mut content = Vec::with_capacity(size as usize);
        file.read_to_end(&mut content).map_err(|e| {
            LogviewError::file_error(format!("Failed to read {}", path.display()), e)
        })?;
        Ok(content)
    }

    /// Get the underlying bytes as a slice regardless of storage strategy
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ByteSource::Buffered(vec) => vec.as_slice(),
            ByteSource::MemoryMapped(mmap) => &mmap[..],
        }
    }

    /// Strategy this source was loaded with
    pub fn strategy(&self) -> AccessStrategy {
        match self {
            ByteSource::Buffered(_) => AccessStrategy::Buffered,
            ByteSource::MemoryMapped(_) => AccessStrategy::MemoryMapped,
        }
    }
}
