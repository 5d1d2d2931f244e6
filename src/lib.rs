//! # logview - Line-Indexed Log File Access
//!
//! The core of a log viewer: random access to any window of lines in a file of
//! unbounded size, with cheap change detection and full re-indexing when the file
//! is modified, truncated or rotated.
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`config`] - Loader and viewer settings, optionally loaded from TOML
//! - [`file_handler`] - Line index, I/O strategy selection and the [`FileLoader`]
//!
//! ## Example
//!
//! ```no_run
//! use logview::FileLoader;
//!
//! let mut loader = FileLoader::open("/var/log/syslog")?;
//! for line in loader.read_lines(0, 20) {
//!     println!("{line}");
//! }
//! if loader.reload()? {
//!     println!("now {} lines", loader.line_count());
//! }
//! # Ok::<(), logview::LogviewError>(())
//! ```
//!
//! The library logs through the `log` facade and never installs a logger itself.

pub mod config;
pub mod error;
pub mod file_handler;

// Re-export commonly used types for convenience
pub use config::{LoaderConfig, ViewerConfig};
pub use error::{LogviewError, Result};
pub use file_handler::{AccessStrategy, FileLoader};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
