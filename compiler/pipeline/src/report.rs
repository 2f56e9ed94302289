//! Per-model state and the run report.

use std::path::Path;

use chrono::{DateTime, Utc};
use config::FailurePolicy;
use registry::ModelDescriptor;
use serde::Serialize;

use crate::converter::ConversionStrategy;
use crate::generator::GenerationAttempt;
use crate::{PipelineError, Result};

/// Where a model is in its pipeline.
///
/// `Pending → Fetched → Converted → Generated → Done`, or `Failed` from any
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    /// Nothing done yet.
    Pending,
    /// Raw spec downloaded.
    Fetched,
    /// Converted spec written and verified non-empty.
    Converted,
    /// Client source written.
    Generated,
    /// Finished successfully.
    Done,
    /// Stopped on an error.
    Failed,
}

impl ModelState {
    /// `Done` and `Failed` have no successor.
    pub fn is_terminal(self) -> bool { matches!(self, ModelState::Done | ModelState::Failed) }
}

impl std::fmt::Display for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModelState::Pending => "pending",
            ModelState::Fetched => "fetched",
            ModelState::Converted => "converted",
            ModelState::Generated => "generated",
            ModelState::Done => "done",
            ModelState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What happened to one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelOutcome {
    /// Descriptor's source file name.
    pub source_file_name: String,
    /// Generator package name.
    pub package: String,
    /// Final state.
    pub state: ModelState,
    /// The state the model was in when it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_from: Option<ModelState>,
    /// Conversion strategy that succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConversionStrategy>,
    /// Generator attempt that succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationAttempt>,
    /// Rendered error, when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelOutcome {
    /// A fresh, pending outcome for `model`.
    pub fn pending(model: &ModelDescriptor, package: &str) -> Self {
        Self {
            source_file_name: model.source_file_name.clone(),
            package: package.to_string(),
            state: ModelState::Pending,
            failed_from: None,
            conversion: None,
            generation: None,
            error: None,
        }
    }

    /// Record a failure in the current state.
    pub fn fail(&mut self, error: &PipelineError) {
        self.failed_from = Some(self.state);
        self.state = ModelState::Failed;
        self.error = Some(error.to_string());
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished; `None` while in progress.
    pub finished_at: Option<DateTime<Utc>>,
    /// Failure policy in effect.
    pub policy: FailurePolicy,
    /// One entry per processed model, in registry order.
    pub outcomes: Vec<ModelOutcome>,
    /// Whether the dependency-tidy step ran.
    pub tidied: bool,
    /// Tidy failure recorded under the isolate policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tidy_error: Option<String>,
}

impl RunReport {
    /// Start a report now.
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            policy,
            outcomes: Vec::new(),
            tidied: false,
            tidy_error: None,
        }
    }

    /// Stamp the finish time.
    pub fn finish(&mut self) { self.finished_at = Some(Utc::now()); }

    /// Number of models that reached `Done`.
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.state == ModelState::Done).count()
    }

    /// Number of failed models.
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.state == ModelState::Failed).count()
    }

    /// Source file names of failed models.
    pub fn failed_names(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.state == ModelState::Failed)
            .map(|o| o.source_file_name.as_str())
            .collect()
    }

    /// True when no model failed and tidy did not fail.
    pub fn is_success(&self) -> bool { self.failed_count() == 0 && self.tidy_error.is_none() }

    /// One-line description of what went wrong.
    pub fn summary(&self) -> String {
        let mut summary = format!("{} of {} models failed", self.failed_count(), self.outcomes.len());
        let failed = self.failed_names();
        if !failed.is_empty() {
            summary.push_str(&format!(": {}", failed.join(", ")));
        }
        if let Some(error) = &self.tidy_error {
            summary.push_str(&format!("; {}", error));
        }
        summary
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            PipelineError::filesystem(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        std::fs::write(path, json).map_err(|e| PipelineError::filesystem(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, state: ModelState) -> ModelOutcome {
        let model = ModelDescriptor::new(name, format!("p/{}", name), "out/x");
        let mut outcome = ModelOutcome::pending(&model, "x");
        outcome.state = state;
        outcome
    }

    #[test]
    fn test_counts() {
        let mut report = RunReport::new(FailurePolicy::Isolate);
        assert!(report.is_success());

        report.outcomes.push(outcome("a.json", ModelState::Done));
        report.outcomes.push(outcome("b.json", ModelState::Failed));
        report.outcomes.push(outcome("c.json", ModelState::Done));

        assert_eq!(report.succeeded_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.failed_names(), vec!["b.json"]);
        assert!(!report.is_success());
        assert_eq!(report.summary(), "1 of 3 models failed: b.json");
    }

    #[test]
    fn test_tidy_error_fails_the_run() {
        let mut report = RunReport::new(FailurePolicy::Isolate);
        report.outcomes.push(outcome("a.json", ModelState::Done));
        report.tidy_error = Some("Dependency tidy failed: exit code 1".to_string());

        assert!(!report.is_success());
        assert_eq!(
            report.summary(),
            "0 of 1 models failed; Dependency tidy failed: exit code 1"
        );
    }

    #[test]
    fn test_fail_records_previous_state() {
        let mut o = outcome("a.json", ModelState::Fetched);
        o.fail(&PipelineError::EmptyContent { path: "models/a.yaml".into() });
        assert_eq!(o.state, ModelState::Failed);
        assert_eq!(o.failed_from, Some(ModelState::Fetched));
        assert!(o.error.as_deref().is_some_and(|e| e.contains("empty content")));
        assert!(o.state.is_terminal());
        assert!(!ModelState::Converted.is_terminal());
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");

        let mut report = RunReport::new(FailurePolicy::Abort);
        let mut done = outcome("a.json", ModelState::Done);
        done.conversion = Some(ConversionStrategy::LocalContent);
        done.generation = Some(GenerationAttempt::Primary);
        report.outcomes.push(done);
        report.finish();
        report.write_json(&path).expect("write report");

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read report"))
                .expect("valid json");
        assert_eq!(value["policy"], "abort");
        assert_eq!(value["outcomes"][0]["state"], "done");
        assert_eq!(value["outcomes"][0]["conversion"], "local_content");
        assert_eq!(value["outcomes"][0]["generation"], "primary");
        assert!(value["outcomes"][0].get("error").is_none());
        assert!(value["finished_at"].is_string());
    }
}
