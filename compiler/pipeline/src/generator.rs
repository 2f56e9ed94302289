//! Client generation.
//!
//! Runs the external generator against the converted spec. If that fails,
//! exactly one more attempt is made against the raw JSON download without
//! the response-type suffix. The fallback input is passed in explicitly
//! rather than derived from the converted path.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::process::{DynRunner, Invocation};
use crate::{PipelineError, Result};

/// Which invocation produced the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationAttempt {
    /// Converted spec, with the response-type suffix.
    Primary,
    /// Raw spec, without the suffix.
    Fallback,
}

/// Everything one generation needs. Paths are relative to `working_dir`.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// Package (namespace) name for the generated code.
    pub package: &'a str,
    /// Converted spec used by the primary attempt.
    pub spec: &'a Path,
    /// Raw spec used by the fallback attempt.
    pub fallback_spec: &'a Path,
    /// Generated client file.
    pub output: &'a Path,
}

/// Drives the external code generator.
#[derive(Clone)]
pub struct ClientGenerator {
    runner: DynRunner,
    executable: PathBuf,
    targets: Vec<String>,
    response_type_suffix: String,
    working_dir: Option<PathBuf>,
}

impl ClientGenerator {
    /// `targets` are joined into the `-generate` flag; an empty suffix omits
    /// `-response-type-suffix` even on the primary attempt.
    pub fn new(
        runner: DynRunner,
        executable: PathBuf,
        targets: Vec<String>,
        response_type_suffix: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            executable,
            targets,
            response_type_suffix: response_type_suffix.into(),
            working_dir: None,
        }
    }

    /// A copy of this generator invoking `executable` instead.
    pub fn with_executable(&self, executable: PathBuf) -> Self {
        Self { executable, ..self.clone() }
    }

    /// Run the generator inside `dir`.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn base_invocation(&self, package: &str, output: &Path) -> Invocation {
        let mut inv = Invocation::new(&self.executable)
            .args(["-package", package])
            .args(["-generate".to_string(), self.targets.join(",")])
            .args(["-o".to_string(), output.display().to_string()]);
        if let Some(dir) = &self.working_dir {
            inv = inv.current_dir(dir);
        }
        inv
    }

    /// The primary invocation: converted spec, suffix applied.
    pub fn primary_invocation(&self, request: &GenerationRequest<'_>) -> Invocation {
        let mut inv = self.base_invocation(request.package, request.output);
        if !self.response_type_suffix.is_empty() {
            inv = inv.args(["-response-type-suffix", self.response_type_suffix.as_str()]);
        }
        inv.arg(request.spec.display().to_string())
    }

    /// The fallback invocation: raw spec, no suffix.
    pub fn fallback_invocation(&self, request: &GenerationRequest<'_>) -> Invocation {
        self.base_invocation(request.package, request.output)
            .arg(request.fallback_spec.display().to_string())
    }

    /// Generate the client, falling back once to the raw spec.
    ///
    /// # Errors
    /// [`PipelineError::Generation`] with the fallback's failure detail when
    /// both attempts fail.
    pub async fn generate(&self, request: &GenerationRequest<'_>) -> Result<GenerationAttempt> {
        let primary = self.primary_invocation(request);
        tracing::info!("Generating {} client", request.package);

        let primary_err = match self.runner.run(&primary).await {
            Ok(_) => return Ok(GenerationAttempt::Primary),
            Err(e) => e,
        };
        tracing::warn!(
            "Generation from {} failed ({}), retrying with {}",
            request.spec.display(),
            primary_err,
            request.fallback_spec.display()
        );

        let fallback = self.fallback_invocation(request);
        match self.runner.run(&fallback).await {
            Ok(_) => Ok(GenerationAttempt::Fallback),
            Err(e) => Err(PipelineError::Generation {
                package: request.package.to_string(),
                detail: e.to_string(),
            }),
        }
    }
}
