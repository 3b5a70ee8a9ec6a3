//! Descriptors of the external version control tools
//!
//! A [`VcsTool`] captures everything the generic checkout strategy needs to
//! know about a VCS: which executable to run, the directory its checkouts live
//! in under the user home, the metadata entry that proves a directory is a
//! checkout, and how to build the *fetch* (first checkout) and *update*
//! (refresh an existing checkout) commands.
//!
//! Git is the only tool shipped:
//!
//! | step   | command                 | working directory       |
//! |--------|-------------------------|-------------------------|
//! | fetch  | `git clone <url> <dest>`| `<user home>/gits`      |
//! | update | `git pull <url>`        | `<user home>/gits/<name>` |
//!
//! Git runs with `GIT_TERMINAL_PROMPT=0`, so a repository needing credentials
//! fails instead of waiting for input.

pub mod command_builder;

pub use command_builder::{SystemCommandRunner, VcsCommand, VcsCommandRunner, VcsOutput};

use std::path::{Path, PathBuf};

/// Default git executable name.
pub const GIT: &str = "git";

/// Command-line VCS description used by the generic checkout strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsTool {
    name: &'static str,
    executable: PathBuf,
    checkouts_dir: &'static str,
    metadata_marker: &'static str,
    fetch_args: &'static [&'static str],
    update_args: &'static [&'static str],
    env: &'static [(&'static str, &'static str)],
}

impl VcsTool {
    /// Git, run through `executable` (a name looked up on `PATH`, or a path).
    pub fn git(executable: impl Into<PathBuf>) -> Self {
        Self {
            name: "git",
            executable: executable.into(),
            checkouts_dir: "gits",
            metadata_marker: ".git",
            fetch_args: &["clone"],
            update_args: &["pull"],
            env: &[("GIT_TERMINAL_PROMPT", "0")],
        }
    }

    /// Git using the configured executable, or `git` from `PATH`.
    #[must_use]
    pub fn git_from_config(config: &crate::config::GitConfig) -> Self {
        Self::git(config.executable.as_deref().unwrap_or(GIT))
    }

    /// Short tool name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The executable that is run.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Directory under the user home holding this tool's checkouts.
    #[must_use]
    pub const fn checkouts_dir(&self) -> &'static str {
        self.checkouts_dir
    }

    /// Entry whose presence marks a valid checkout.
    #[must_use]
    pub const fn metadata_marker(&self) -> &'static str {
        self.metadata_marker
    }

    /// Whether `dir` is a directory holding this tool's metadata.
    #[must_use]
    pub fn is_valid_checkout(&self, dir: &Path) -> bool {
        dir.is_dir() && dir.join(self.metadata_marker).exists()
    }

    /// Base command with the tool's environment.
    fn command(&self) -> VcsCommand {
        self.env
            .iter()
            .fold(VcsCommand::new(&self.executable), |command, (key, value)| command.env(*key, *value))
    }

    /// First checkout of `url` into `destination`, run from `checkout_root`.
    #[must_use]
    pub fn fetch_command(&self, url: &str, destination: &Path, checkout_root: &Path) -> VcsCommand {
        self.command()
            .args(self.fetch_args.iter().copied())
            .arg(url)
            .arg(destination.display().to_string())
            .current_dir(checkout_root)
    }

    /// Refresh of the existing checkout in `destination` from `url`.
    #[must_use]
    pub fn update_command(&self, url: &str, destination: &Path) -> VcsCommand {
        self.command()
            .args(self.update_args.iter().copied())
            .arg(url)
            .current_dir(destination)
    }
}
