//! Pipeline orchestration.
//!
//! The driver prepares the workspace, ensures the generator is installed,
//! walks every model through `Pending → Fetched → Converted → Generated →
//! Done`, and finally runs the dependency-tidy step. Models are processed
//! strictly one after another.
//!
//! What happens when a model fails depends on [`FailurePolicy`]:
//! `Abort` stops the run (no later model, no tidy) and returns
//! [`PipelineError::Model`]; `Isolate` records the failure, carries on, and
//! returns [`PipelineError::Incomplete`] at the end.

use std::path::{Path, PathBuf};

use config::{Config, FailurePolicy};
use registry::{ModelDescriptor, ModelPaths, ModelRegistry};
use transport::DynTransport;

use crate::converter::{verify_converted, Converter};
use crate::fetcher::Fetcher;
use crate::generator::{ClientGenerator, GenerationRequest};
use crate::installer::ToolInstaller;
use crate::process::{DynRunner, Invocation};
use crate::report::{ModelOutcome, ModelState, RunReport};
use crate::tidy::DependencyTidy;
use crate::workspace::prepare_workspace;
use crate::{PipelineError, Result};

/// Everything the driver needs for one model, resolved up front.
struct ModelJob<'a> {
    model: &'a ModelDescriptor,
    package: &'a str,
    spec_url: String,
    paths: ModelPaths,
}

/// The pipeline driver.
pub struct Pipeline {
    root: PathBuf,
    models_dir: PathBuf,
    model_prefix: String,
    output_file: String,
    source_base_url: String,
    policy: FailurePolicy,
    registry: ModelRegistry,
    installer: ToolInstaller,
    fetcher: Fetcher,
    converter: Converter,
    generator: ClientGenerator,
    tidy: Option<DependencyTidy>,
}

impl Pipeline {
    /// Build a driver from an explicit configuration.
    ///
    /// The configuration is validated and the generator location resolved
    /// here, so a bad configuration fails before any side effect.
    pub fn new(config: &Config, transport: DynTransport, runner: DynRunner) -> Result<Self> {
        config.validate()?;
        let registry = config.registry()?;
        let root = config.workspace.root.clone();
        let executable = resolve_executable(&root, config.generator_executable()?);

        let install = config.generator.install.then(|| {
            Invocation::new(&config.generator.install_program)
                .args(config.generator.install_args.iter().cloned())
        });
        let installer = ToolInstaller::new(runner.clone(), executable.clone(), install);

        let fetcher = Fetcher::new(transport.clone(), config.sources.fetch_timeout());
        let converter =
            Converter::new(transport, config.converter.base_url.clone(), config.converter.timeout());
        let generator = ClientGenerator::new(
            runner.clone(),
            executable,
            config.generator.targets.clone(),
            config.generator.response_type_suffix.clone(),
        )
        .working_dir(&root);

        let tidy = config.tidy.enabled.then(|| {
            DependencyTidy::new(
                runner,
                Invocation::new(&config.tidy.program)
                    .args(config.tidy.args.iter().cloned())
                    .current_dir(&root),
            )
        });

        Ok(Self {
            models_dir: config.workspace.models_dir.clone(),
            model_prefix: config.workspace.model_prefix.clone(),
            output_file: config.generator.output_file.clone(),
            source_base_url: config.sources.base_url.clone(),
            policy: config.policy,
            root,
            registry,
            installer,
            fetcher,
            converter,
            generator,
            tidy,
        })
    }

    /// Restrict the run to the named models (registry order is kept).
    pub fn select_models<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self> {
        self.registry = self.registry.select(names)?;
        Ok(self)
    }

    /// Override the failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve `relative` against the workspace root.
    fn at_root(&self, relative: &Path) -> PathBuf { self.root.join(relative) }

    /// Run every model, then tidy.
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::new(self.policy);
        tracing::info!(
            "Generating {} clients (policy: {})",
            self.registry.len(),
            self.policy
        );

        prepare_workspace(&self.root, &self.registry.directories(&self.models_dir))?;
        let generator = self.generator.with_executable(self.installer.ensure().await?);

        for model in &self.registry {
            let (outcome, error) = self.process_model(&generator, model).await;
            report.outcomes.push(outcome);

            if let Some(error) = error {
                tracing::error!("Error processing {}: {}", model.source_file_name, error);
                match self.policy {
                    FailurePolicy::Abort => {
                        return Err(PipelineError::Model {
                            source_file_name: model.source_file_name.clone(),
                            source: Box::new(error),
                        });
                    }
                    FailurePolicy::Isolate => continue,
                }
            }
        }

        if let Some(tidy) = &self.tidy {
            if report.succeeded_count() > 0 {
                match tidy.run().await {
                    Ok(()) => report.tidied = true,
                    Err(e) if self.policy == FailurePolicy::Isolate => {
                        tracing::error!("{}", e);
                        report.tidy_error = Some(e.to_string());
                    }
                    Err(e) => return Err(e),
                }
            } else {
                tracing::warn!("Skipping dependency tidy: no client was generated");
            }
        }
        report.finish();

        if report.is_success() {
            tracing::info!("All clients generated successfully.");
            Ok(report)
        } else {
            Err(PipelineError::Incomplete(Box::new(report)))
        }
    }

    /// Drive one model to a terminal state.
    async fn process_model(
        &self,
        generator: &ClientGenerator,
        model: &ModelDescriptor,
    ) -> (ModelOutcome, Option<PipelineError>) {
        // Validated when the registry was built
        let package = match model.package_name() {
            Ok(package) => package,
            Err(e) => {
                let err = PipelineError::from(e);
                let mut outcome = ModelOutcome::pending(model, "");
                outcome.fail(&err);
                return (outcome, Some(err));
            }
        };

        let job = ModelJob {
            model,
            package,
            spec_url: model.spec_url(&self.source_base_url),
            paths: model.paths(&self.models_dir, &self.model_prefix, &self.output_file),
        };
        let mut outcome = ModelOutcome::pending(model, package);

        while !outcome.state.is_terminal() {
            match self.step(generator, &job, &mut outcome).await {
                Ok(next) => {
                    logging::trace(
                        "PIPELINE",
                        &format!("{}: {} -> {}", job.model.source_file_name, outcome.state, next),
                    );
                    outcome.state = next;
                }
                Err(e) => {
                    outcome.fail(&e);
                    return (outcome, Some(e));
                }
            }
        }
        (outcome, None)
    }

    /// Perform the transition out of `outcome.state` and return the next state.
    async fn step(
        &self,
        generator: &ClientGenerator,
        job: &ModelJob<'_>,
        outcome: &mut ModelOutcome,
    ) -> Result<ModelState> {
        match outcome.state {
            ModelState::Pending => {
                self.fetcher.fetch(&job.spec_url, &self.at_root(&job.paths.raw_spec)).await?;
                Ok(ModelState::Fetched)
            }
            ModelState::Fetched => {
                let converted = self.at_root(&job.paths.converted_spec);
                let strategy = self
                    .converter
                    .convert(&job.spec_url, &self.at_root(&job.paths.raw_spec), &converted)
                    .await?;
                verify_converted(&converted).await?;
                outcome.conversion = Some(strategy);
                Ok(ModelState::Converted)
            }
            ModelState::Converted => {
                let request = GenerationRequest {
                    package: job.package,
                    spec: &job.paths.converted_spec,
                    fallback_spec: &job.paths.raw_spec,
                    output: &job.paths.output_file,
                };
                outcome.generation = Some(generator.generate(&request).await?);
                Ok(ModelState::Generated)
            }
            ModelState::Generated => Ok(ModelState::Done),
            terminal @ (ModelState::Done | ModelState::Failed) => Ok(terminal),
        }
    }
}

/// A relative executable with a directory component lives under `root`;
/// bare names are left for the `PATH` lookup.
fn resolve_executable(root: &Path, executable: PathBuf) -> PathBuf {
    let in_subdir = executable.parent().is_some_and(|p| !p.as_os_str().is_empty());
    if executable.is_relative() && in_subdir {
        root.join(executable)
    } else {
        executable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_executable() {
        let root = Path::new("/work");
        assert_eq!(
            resolve_executable(root, PathBuf::from("bin/oapi-codegen")),
            PathBuf::from("/work/bin/oapi-codegen")
        );
        assert_eq!(
            resolve_executable(root, PathBuf::from("oapi-codegen")),
            PathBuf::from("oapi-codegen")
        );
        assert_eq!(
            resolve_executable(root, PathBuf::from("/opt/go/bin/oapi-codegen")),
            PathBuf::from("/opt/go/bin/oapi-codegen")
        );
    }
}
