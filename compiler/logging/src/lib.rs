#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Logging utilities for halycon-gen.
//!
//! [`init`] installs the global `tracing` subscriber once per process;
//! [`trace`] is the module-prefixed helper used on hot paths such as the
//! HTTP backend.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors that can occur while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The level string is not a valid filter directive.
    #[error("Invalid log level '{level}': {reason}")]
    InvalidLevel {
        /// The rejected level string.
        level: String,
        /// Parser message.
        reason: String,
    },
    /// The log file could not be opened for appending.
    #[error("Failed to open log file {path}: {source}")]
    File {
        /// Log file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A global subscriber is already installed.
    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Build the filter: `RUST_LOG` wins over the configured level.
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| LoggingError::InvalidLevel { level: level.to_string(), reason: e.to_string() })
}

/// Install the global subscriber, writing to stderr or appending to `file`.
pub fn init(level: &str, file: Option<&Path>) -> Result<(), LoggingError> {
    let filter = build_filter(level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let installed = match file {
        Some(path) => {
            let handle = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::File { path: path.to_path_buf(), source })?;
            builder.with_ansi(false).with_writer(Mutex::new(handle)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| LoggingError::Install(e.to_string()))
}

/// Emits a trace-level event with a module prefix.
pub fn trace(module: &str, msg: &str) {
    tracing::trace!("[{}] {}", module, msg);
}
