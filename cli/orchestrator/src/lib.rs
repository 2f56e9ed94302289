#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
//! Building blocks of the `halycon-gen` command line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{Config, ConfigError, FailurePolicy};
use http::HttpTransport;
use logging::LoggingError;
use pipeline::{Pipeline, PipelineError, RunReport, SystemRunner};
use registry::RegistryError;
use thiserror::Error;

/// Errors surfaced by the command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded, saved or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Logging could not be initialised.
    #[error(transparent)]
    Logging(#[from] LoggingError),
    /// The pipeline failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// A registry entry is invalid.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// `init-config` target exists and `--force` was not given.
    #[error("{} already exists (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),
    /// A directory could not be created.
    #[error("Failed to create {}: {source}", .path.display())]
    Io {
        /// Directory being created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Options of the `run` subcommand that override the configuration.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Restrict the run to these source file names.
    pub models: Vec<String>,
    /// Keep going after a model fails.
    pub isolate: bool,
    /// Never install the generator.
    pub skip_install: bool,
    /// Skip the dependency-tidy step.
    pub skip_tidy: bool,
    /// Workspace root override.
    pub root: Option<PathBuf>,
    /// Where to write the JSON run report.
    pub report: Option<PathBuf>,
}

impl RunOptions {
    /// Fold the flags into `config`.
    pub fn apply(&self, config: &mut Config) {
        if self.isolate {
            config.policy = FailurePolicy::Isolate;
        }
        if self.skip_install {
            config.generator.install = false;
        }
        if self.skip_tidy {
            config.tidy.enabled = false;
        }
        if let Some(root) = &self.root {
            config.workspace.root = root.clone();
        }
    }
}

/// Run the pipeline against the real network and toolchain.
///
/// The report is written whenever one exists, including after an
/// incomplete isolate-policy run.
pub async fn run(config: &Config, options: &RunOptions) -> Result<RunReport> {
    let mut pipeline =
        Pipeline::new(config, Arc::new(HttpTransport::new()), Arc::new(SystemRunner::new()))?;
    if !options.models.is_empty() {
        pipeline = pipeline.select_models(&options.models)?;
    }

    let outcome = pipeline.run().await;
    if let Some(path) = &options.report {
        let report = match &outcome {
            Ok(report) => Some(report),
            Err(PipelineError::Incomplete(report)) => Some(report.as_ref()),
            Err(_) => None,
        };
        if let Some(report) = report {
            report.write_json(path)?;
            tracing::info!("Run report written to {}", path.display());
        }
    }
    Ok(outcome?)
}

/// One line per model: source file, package, spec URL and generated file.
pub fn describe_models(config: &Config) -> Result<Vec<String>> {
    let registry = config.registry()?;
    let mut lines = Vec::with_capacity(registry.len());
    for model in &registry {
        let paths = model.paths(
            &config.workspace.models_dir,
            &config.workspace.model_prefix,
            &config.generator.output_file,
        );
        lines.push(format!(
            "{}\t{}\t{}\t{}",
            model.source_file_name,
            model.package_name()?,
            model.spec_url(&config.sources.base_url),
            paths.output_file.display()
        ));
    }
    Ok(lines)
}

/// Write the default configuration to `path`.
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::AlreadyExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|source| CliError::Io { path: parent.to_path_buf(), source })?;
    }
    Config::default().save(path)?;
    Ok(())
}
