#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! High-level pipeline that turns upstream API models into generated
//! client bindings.
//!
//! For every model in the registry the pipeline downloads the raw spec,
//! converts it through a remote conversion service, and runs an external
//! code generator against the result. A final dependency-tidy command runs
//! once every client has been written.
//!
//! ## Module Organization
//!
//! - `workspace` - Creates the directories the run writes into
//! - `installer` - Makes sure the generator executable is available
//! - `fetcher` - Downloads raw specs
//! - `converter` - Converts specs, with a local-content fallback
//! - `generator` - Invokes the generator, with a raw-spec fallback
//! - `tidy` - The final dependency-tidy command
//! - `process` - Subprocess seam shared by installer, generator and tidy
//! - `report` - Per-model state and the run report
//! - `orchestration` - The driver sequencing all of the above

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use transport::TransportError;

/// Convenient result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while running the generation pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A directory or file could not be created, read or written.
    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The generator executable is unavailable and could not be installed.
    #[error("Generator tool unavailable: {0}")]
    ToolInstall(String),
    /// A network call exceeded its wall-clock bound.
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout {
        /// Target URL.
        url: String,
        /// The bound that was exceeded.
        timeout: Duration,
    },
    /// A remote party answered with a non-2xx status.
    #[error("HTTP {status}: {reason} ({url})")]
    Http {
        /// Target URL.
        url: String,
        /// Status code.
        status: u16,
        /// Reason phrase.
        reason: String,
    },
    /// Connection-level network failure.
    #[error("Network error: {0}")]
    Network(String),
    /// Conversion produced no usable output.
    #[error("Conversion produced empty content at {}", .path.display())]
    EmptyContent {
        /// The converted file (or the URL-based response target).
        path: PathBuf,
    },
    /// Both conversion strategies failed.
    #[error("Conversion failed: {primary}; fallback conversion failed: {fallback}")]
    Conversion {
        /// Error from the remote-URL strategy.
        primary: Box<PipelineError>,
        /// Error from the local-content strategy.
        fallback: Box<PipelineError>,
    },
    /// The generator failed on both the primary and the fallback input.
    #[error("Could not generate client for {package} even from original JSON: {detail}")]
    Generation {
        /// Package being generated.
        package: String,
        /// Failure detail of the fallback invocation.
        detail: String,
    },
    /// The final dependency-tidy command failed.
    #[error("Dependency tidy failed: {0}")]
    Tidy(String),
    /// A model failed; carries the model's source file name.
    #[error("Error processing {source_file_name}: {source}")]
    Model {
        /// Source file name of the failing model.
        source_file_name: String,
        /// What went wrong.
        source: Box<PipelineError>,
    },
    /// Isolate policy: the run finished but a model or the tidy step failed.
    #[error("{}", .0.summary())]
    Incomplete(Box<report::RunReport>),
    /// Configuration could not be turned into a pipeline.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Model selection or registry error.
    #[error(transparent)]
    Registry(#[from] registry::RegistryError),
}

impl PipelineError {
    /// Shorthand for [`PipelineError::Filesystem`].
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Filesystem { path: path.into(), source }
    }
}

impl From<TransportError> for PipelineError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { url, timeout } => PipelineError::Timeout { url, timeout },
            other => PipelineError::Network(other.to_string()),
        }
    }
}

// Module declarations
pub mod converter;
pub mod fetcher;
pub mod generator;
pub mod installer;
pub mod orchestration;
pub mod process;
pub mod report;
pub mod tidy;
pub mod workspace;

// Re-export public API from orchestration module
pub use orchestration::Pipeline;
pub use process::{CommandRunner, DynRunner, Invocation, SystemRunner};
pub use report::{ModelOutcome, ModelState, RunReport};
