//! Builder and runner for external VCS commands
//!
//! Checkouts never talk a VCS protocol themselves; they run the VCS's own
//! executable. [`VcsCommand`] describes one invocation and [`VcsCommandRunner`]
//! executes it. The production runner is [`SystemCommandRunner`]; tests swap in
//! a fake that records commands instead of spawning processes.
//!
//! ```rust,no_run
//! use vcsdeps::vcs::{SystemCommandRunner, VcsCommand, VcsCommandRunner};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let command = VcsCommand::new("git")
//!     .args(["clone", "https://github.com/gradle/gradle", "/tmp/gits/gradle"])
//!     .current_dir("/tmp/gits")
//!     .with_context("gradle");
//! let output = SystemCommandRunner::new().run(&command).await?;
//! assert!(output.success());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::core::VcsError;

/// One external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsCommand {
    program: PathBuf,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    env_vars: Vec<(String, String)>,
    context: Option<String>,
}

impl VcsCommand {
    /// Command running `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env_vars: Vec::new(),
            context: None,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Working directory of the process.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Extra environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Label prefixed to log lines, usually the repository name.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// The executable.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The arguments.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// The working directory, if set.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Environment variables set for the process.
    #[must_use]
    pub fn env_vars(&self) -> &[(String, String)] {
        &self.env_vars
    }

    /// Program and arguments joined by spaces, for messages.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcsOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl VcsOutput {
    /// Output of a process that exited with status 0.
    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            exit_code: Some(0),
            ..Self::default()
        }
    }

    /// Whether the process exited normally with status 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Executes [`VcsCommand`]s.
///
/// A runner returns `Ok` for every process that ran, whatever its exit status;
/// `Err` means the process could not be started.
pub trait VcsCommandRunner: Send + Sync {
    /// Resolve `program` to the executable that would be run.
    ///
    /// Called before a checkout touches its slot, so a missing VCS is reported
    /// without disturbing existing checkouts.
    ///
    /// # Errors
    ///
    /// [`VcsError::VcsNotFound`] when the executable cannot be found.
    fn locate(&self, program: &Path) -> Result<PathBuf, VcsError>;

    /// Run the command to completion. No timeout is applied.
    fn run(&self, command: &VcsCommand) -> impl Future<Output = Result<VcsOutput>> + Send;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    /// New runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl VcsCommandRunner for SystemCommandRunner {
    fn locate(&self, program: &Path) -> Result<PathBuf, VcsError> {
        which::which(program).map_err(|_| VcsError::VcsNotFound {
            executable: program.display().to_string(),
        })
    }

    async fn run(&self, command: &VcsCommand) -> Result<VcsOutput> {
        let program = self.locate(command.program())?;

        let label = command.context.as_deref().unwrap_or("vcs");
        tracing::debug!(target: "vcs", "({label}) Executing command: {}", command.command_line());
        if let Some(dir) = command.working_dir() {
            tracing::trace!(target: "vcs", "({label}) Working directory: {}", dir.display());
        }

        let mut cmd = Command::new(&program);
        cmd.args(command.arguments()).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(dir) = command.working_dir() {
            cmd.current_dir(dir);
        }
        for (key, value) in &command.env_vars {
            tracing::trace!(target: "vcs", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }

        let start = std::time::Instant::now();
        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", command.command_line()))?;

        let result = VcsOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.stdout.trim().is_empty() {
            tracing::debug!(target: "vcs", "({label}) {}", result.stdout.trim());
        }
        if !result.stderr.trim().is_empty() {
            tracing::debug!(target: "vcs", "({label}) {}", result.stderr.trim());
        }
        if result.success() {
            tracing::trace!(target: "vcs", "({label}) Completed in {:.2}s", start.elapsed().as_secs_f64());
        } else {
            tracing::debug!(target: "vcs", "({label}) Command failed with exit code: {:?}", result.exit_code);
        }

        Ok(result)
    }
}
