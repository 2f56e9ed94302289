//! Subprocess execution.
//!
//! The installer, the client generator and the tidy step all shell out.
//! They describe what to run as an [`Invocation`] and hand it to a
//! [`CommandRunner`]; [`SystemRunner`] is the real implementation. No
//! timeout is applied: a command runs until it exits.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// A program plus its arguments and optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute.
    pub program: PathBuf,
    /// Arguments, passed verbatim (no shell).
    pub args: Vec<String>,
    /// Working directory; inherits the current one when `None`.
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    /// Start describing a run of `program` with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), args: Vec::new(), current_dir: None }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run inside `dir`.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Whether `arg` appears among the arguments.
    pub fn has_arg(&self, arg: &str) -> bool { self.args.iter().any(|a| a == arg) }

    /// The value following `flag`, if any.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args.iter().position(|a| a == flag).and_then(|i| self.args.get(i + 1)).map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

/// Why a command did not succeed.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The process could not be started (missing executable, permissions).
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// Rendered invocation.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The process ran and exited unsuccessfully.
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        /// Rendered invocation.
        command: String,
        /// Exit code, or a description when killed by a signal.
        status: String,
        /// Trimmed standard error.
        stderr: String,
    },
}

/// Executes invocations. Implementations must not apply a timeout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `invocation` to completion; a non-zero exit is an error.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError>;
}

/// Shared, dynamically dispatched runner.
pub type DynRunner = Arc<dyn CommandRunner>;

/// Runs invocations as real child processes via `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a runner.
    pub fn new() -> Self { Self }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        let command = invocation.to_string();
        tracing::debug!("$ {}", command);

        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.current_dir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .map_err(|source| CommandError::Spawn { command: command.clone(), source })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !stdout.trim().is_empty() {
            tracing::debug!("{}", stdout.trim_end());
        }

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            let status = match output.status.code() {
                Some(code) => format!("exit code {}", code),
                None => "termination by signal".to_string(),
            };
            Err(CommandError::Failed { command, status, stderr: stderr.trim().to_string() })
        }
    }
}

/// Resolve `program` the way a shell would: paths with a directory
/// component must exist as given, bare names are looked up on `PATH`.
pub fn locate(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 || program.is_absolute() {
        return program.is_file().then(|| program.to_path_buf());
    }
    which::which(program).ok()
}
