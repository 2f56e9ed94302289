//! Generator installation.
//!
//! [`ToolInstaller::ensure`] guarantees the generator executable exists
//! before any model is processed. Failure here aborts the whole run.

use std::path::PathBuf;

use crate::process::{locate, DynRunner, Invocation};
use crate::{PipelineError, Result};

/// Ensures the code generator is present, installing it when missing.
pub struct ToolInstaller {
    runner: DynRunner,
    executable: PathBuf,
    install: Option<Invocation>,
}

impl ToolInstaller {
    /// `install` is the command that builds/installs `executable`; `None`
    /// disables installation, in which case the executable must already exist.
    pub fn new(runner: DynRunner, executable: PathBuf, install: Option<Invocation>) -> Self {
        Self { runner, executable, install }
    }

    /// Return the resolved executable, installing it first if needed.
    pub async fn ensure(&self) -> Result<PathBuf> {
        if let Some(found) = locate(&self.executable) {
            tracing::info!("Generator found at {}", found.display());
            return Ok(found);
        }

        let install = self.install.as_ref().ok_or_else(|| {
            PipelineError::ToolInstall(format!(
                "{} not found and installation is disabled",
                self.executable.display()
            ))
        })?;

        tracing::info!("Installing generator: {}", install);
        self.runner.run(install).await.map_err(|e| PipelineError::ToolInstall(e.to_string()))?;

        locate(&self.executable).ok_or_else(|| {
            PipelineError::ToolInstall(format!(
                "{} still missing after `{}`",
                self.executable.display(),
                install
            ))
        })
    }
}
