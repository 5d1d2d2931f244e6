//! Configuration for the loader and the viewer front-end.
//!
//! Every setting has a built-in default, so configuration is optional. With the
//! `config` feature enabled, a [`ViewerConfig`] can also be read from a TOML file,
//! by default `<config_dir>/logview/config.toml`.

use crate::file_handler::DEFAULT_MMAP_THRESHOLD;
use std::time::Duration;

#[cfg(feature = "config")]
use crate::error::{LogviewError, Result};
#[cfg(feature = "config")]
use std::path::{Path, PathBuf};

/// Settings that affect how a [`FileLoader`](crate::FileLoader) builds its index
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct LoaderConfig {
    /// Files at or above this many bytes are memory-mapped while indexing
    pub mmap_threshold: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
        }
    }
}

/// Settings for the interactive viewer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ViewerConfig {
    pub loader: LoaderConfig,

    /// How often follow mode polls the file for changes
    pub poll_interval_ms: u64,

    /// Lines shown when no explicit count is requested
    pub page_lines: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            poll_interval_ms: 1000,
            page_lines: 50,
        }
    }
}

impl ViewerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Parse a configuration from TOML text; missing keys keep their defaults
    #[cfg(feature = "config")]
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| LogviewError::config(e.to_string()))
    }

    /// Load a configuration file
    #[cfg(feature = "config")]
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LogviewError::file_error(format!("Failed to read config {}", path.display()), e)
        })?;
        Self::from_toml_str(&text)
    }

    /// Default config file location, if the platform has a config directory
    #[cfg(feature = "config")]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("logview").join("config.toml"))
    }

    /// Load the default config file when present, otherwise use defaults
    #[cfg(feature = "config")]
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}
