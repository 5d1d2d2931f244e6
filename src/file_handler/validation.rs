//! File validation run before a loader is constructed.
//!
//! A loader without a valid index is meaningless, so every problem found here is a
//! hard error for the caller. Empty files are valid: they index to zero lines.

use crate::error::{LogviewError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Validate that `path` names a readable regular file and resolve it
///
/// # Returns
/// * The canonical absolute path of the file
///
/// # Error Cases
/// - File does not exist (`FileNotFound`)
/// - Path points to a directory or other non-regular file (`NotAFile`)
/// - File is not readable due to permissions (`PermissionDenied`)
pub fn validate_file_path(path: &Path) -> Result<PathBuf> {
    let metadata = std::fs::metadata(path).map_err(|e| LogviewError::from_io(path, e))?;

    if !metadata.is_file() {
        return Err(LogviewError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    // Try to open the file to verify read permissions
    File::open(path).map_err(|e| LogviewError::from_io(path, e))?;

    std::fs::canonicalize(path).map_err(|e| LogviewError::from_io(path, e))
}
