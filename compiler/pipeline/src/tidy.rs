//! Final dependency-tidy step.

use crate::process::{DynRunner, Invocation};
use crate::{PipelineError, Result};

/// Reconciles the consuming project's dependency manifest once every
/// client has been written.
pub struct DependencyTidy {
    runner: DynRunner,
    invocation: Invocation,
}

impl DependencyTidy {
    /// Tidy by running `invocation`.
    pub fn new(runner: DynRunner, invocation: Invocation) -> Self { Self { runner, invocation } }

    /// Run the tidy command.
    pub async fn run(&self) -> Result<()> {
        tracing::info!("Running {}", self.invocation);
        self.runner
            .run(&self.invocation)
            .await
            .map(|_| ())
            .map_err(|e| PipelineError::Tidy(e.to_string()))
    }
}
