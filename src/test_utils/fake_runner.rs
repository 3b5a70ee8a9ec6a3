//! In-process replacement for the external VCS executable

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::core::VcsError;
use crate::vcs::{VcsCommand, VcsCommandRunner, VcsOutput};

/// Records commands and simulates `clone`/`pull` on the filesystem.
///
/// - `clone <url> <dest>` creates `<dest>/.git` and writes the configured files
/// - `pull <url>` appends the URL to `.git/pulls` in the working directory
///
/// When built with [`failing`](Self::failing) every command "exits" with the
/// given code and touches nothing. [`without_executable`](Self::without_executable)
/// simulates a VCS that is not installed.
#[derive(Debug, Default)]
pub struct FakeVcsRunner {
    commands: Mutex<Vec<VcsCommand>>,
    failure: Option<Option<i32>>,
    missing_executable: bool,
    files: Vec<(String, String)>,
}

impl FakeVcsRunner {
    /// Runner whose commands all succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner whose commands all fail with `exit_code` (`None` for a signal).
    #[must_use]
    pub fn failing(exit_code: Option<i32>) -> Self {
        Self {
            failure: Some(exit_code),
            ..Self::default()
        }
    }

    /// Runner whose executable cannot be found.
    #[must_use]
    pub fn without_executable() -> Self {
        Self {
            missing_executable: true,
            ..Self::default()
        }
    }

    /// Write `content` to `relative_path` in every simulated clone.
    #[must_use]
    pub fn with_file(mut self, relative_path: &str, content: &str) -> Self {
        self.files.push((relative_path.to_string(), content.to_string()));
        self
    }

    /// Every command run so far.
    pub fn commands(&self) -> Vec<VcsCommand> {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Command lines of every command run so far.
    pub fn command_lines(&self) -> Vec<String> {
        self.commands().iter().map(VcsCommand::command_line).collect()
    }

    fn simulate(&self, command: &VcsCommand) -> Result<()> {
        let args = command.arguments();
        match args.first().map(String::as_str) {
            Some("clone") => {
                let destination = PathBuf::from(args.get(2).context("clone without destination")?);
                std::fs::create_dir_all(destination.join(".git"))?;
                for (path, content) in &self.files {
                    let file = destination.join(path);
                    if let Some(parent) = file.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(file, content)?;
                }
            }
            Some("pull") => {
                let working_dir = command.working_dir().context("pull without working directory")?;
                let log = working_dir.join(".git").join("pulls");
                let mut pulls = std::fs::read_to_string(&log).unwrap_or_default();
                pulls.push_str(args.get(1).map_or("", String::as_str));
                pulls.push('\n');
                std::fs::write(log, pulls)?;
            }
            _ => {}
        }
        Ok(())
    }
}

impl VcsCommandRunner for FakeVcsRunner {
    fn locate(&self, program: &Path) -> Result<PathBuf, VcsError> {
        if self.missing_executable {
            return Err(VcsError::VcsNotFound {
                executable: program.display().to_string(),
            });
        }
        Ok(program.to_path_buf())
    }

    async fn run(&self, command: &VcsCommand) -> Result<VcsOutput> {
        self.locate(command.program())?;
        self.commands.lock().unwrap_or_else(PoisonError::into_inner).push(command.clone());

        if let Some(exit_code) = self.failure {
            return Ok(VcsOutput {
                exit_code,
                stdout: String::new(),
                stderr: "fatal: simulated failure".to_string(),
            });
        }

        self.simulate(command)?;
        Ok(VcsOutput::succeeded())
    }
}
