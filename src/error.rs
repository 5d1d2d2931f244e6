//! Error types and handling infrastructure for logview.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! library error types. The binary wraps these in `anyhow` for context at the edges.
//!
//! Only construction and rebuild of a [`FileLoader`](crate::FileLoader) surface
//! errors to the caller. Reads, change detection and mapping failures degrade
//! locally and are reported through the `log` facade instead.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for logview operations.
#[derive(Error, Debug)]
pub enum LogviewError {
    /// File system related errors (open, stat, read failures)
    #[error("File operation failed: {message}")]
    FileError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// File not found specifically (common case for user feedback)
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Path exists but is not a regular file
    #[error("Path is not a regular file: {path}")]
    NotAFile { path: PathBuf },

    /// Permission denied accessing file
    #[error("Permission denied accessing file: {path}")]
    PermissionDenied { path: PathBuf },

    /// Memory mapping related errors
    #[error("Memory mapping failed: {message}")]
    MemoryMappingError { message: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

/// Standard Result type for logview operations.
pub type Result<T> = std::result::Result<T, LogviewError>;

impl LogviewError {
    /// Create a FileError from an io::Error with additional context
    pub fn file_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// Map an io::Error raised while accessing `path` to the most specific variant
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::FileError {
                message: format!("Failed to access {}", path.display()),
                source: err,
            },
        }
    }

    /// Create a MemoryMappingError with a descriptive message
    pub fn memory_mapping(message: impl Into<String>) -> Self {
        Self::MemoryMappingError {
            message: message.into(),
        }
    }

    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}
