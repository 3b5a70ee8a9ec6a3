//! Materializing repositories into local working directories
//!
//! [`CheckoutEngine::checkout`] is the single entry point used by both loader
//! decorators. It picks a strategy from the [`VcsKind`]:
//!
//! - [`VcsKind::Git`]: the generic VCS strategy. Clone into
//!   `<user home>/gits/<name>` on first use, pull afterwards. A destination
//!   that is not a valid checkout, or whose previous writer crashed, is deleted
//!   and cloned again.
//! - [`VcsKind::Directory`]: copy the source directory into
//!   `<user home>/vcs/<hash of its absolute path>`, replacing any previous copy.
//!
//! Every mutation of a destination happens inside the
//! [`CrossProcessCacheGuard`](crate::cache::CrossProcessCacheGuard) of its slot,
//! so two processes checking out the same repository run one after the other.
//!
//! Every returned working directory contains a `settings.toml`, created empty
//! when the checkout has none, so it can be included as a build.

mod directory;
mod generic;

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cache::CacheRoot;
use crate::repository::VcsKind;
use crate::vcs::{VcsCommandRunner, VcsTool};

/// How a working directory came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Fetched from scratch.
    Cloned,
    /// An existing checkout was updated.
    Updated,
    /// A local directory was copied.
    Copied,
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloned => write!(f, "cloned"),
            Self::Updated => write!(f, "updated"),
            Self::Copied => write!(f, "copied"),
        }
    }
}

/// A materialized checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutResult {
    /// Absolute working directory
    pub working_dir: PathBuf,
    /// What was done to produce it
    pub freshness: Freshness,
}

/// Checks out repositories into the cache, under cross-process locks.
#[derive(Debug)]
pub struct CheckoutEngine<R> {
    cache_root: CacheRoot,
    runner: R,
    git: VcsTool,
}

impl<R: VcsCommandRunner> CheckoutEngine<R> {
    /// Engine writing under `cache_root`, running VCS commands through `runner`.
    pub const fn new(cache_root: CacheRoot, runner: R, git: VcsTool) -> Self {
        Self {
            cache_root,
            runner,
            git,
        }
    }

    /// The cache the engine writes to.
    #[must_use]
    pub const fn cache_root(&self) -> &CacheRoot {
        &self.cache_root
    }

    /// The command runner.
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Destination a repository would be checked out to.
    ///
    /// # Errors
    ///
    /// Fails for directory repositories whose source does not exist.
    pub fn destination_of(&self, name: &str, kind: &VcsKind) -> Result<PathBuf> {
        match kind {
            VcsKind::Git { .. } => Ok(generic::destination(&self.cache_root, &self.git, name)),
            VcsKind::Directory { dir } => {
                let source = directory::absolute_source(name, dir)?;
                Ok(directory::destination(&self.cache_root, &source))
            }
        }
    }

    /// Check out `kind` under `name`, holding the destination's lock throughout.
    ///
    /// # Errors
    ///
    /// - [`VcsError::InvalidRepositoryName`](crate::core::VcsError::InvalidRepositoryName)
    /// - [`VcsError::CreateDirFailed`](crate::core::VcsError::CreateDirFailed)
    /// - [`VcsError::CheckoutFailed`](crate::core::VcsError::CheckoutFailed) with the
    ///   command line, exit code and destination
    /// - [`VcsError::SourceDirectoryMissing`](crate::core::VcsError::SourceDirectoryMissing)
    /// - [`VcsError::VcsNotFound`](crate::core::VcsError::VcsNotFound)
    /// - filesystem and lock errors
    pub async fn checkout(&self, name: &str, kind: &VcsKind) -> Result<CheckoutResult> {
        if let VcsKind::Git { .. } = kind {
            let executable = self
                .runner
                .locate(self.git.executable())
                .with_context(|| format!("Failed to check out '{name}' from {kind}"))?;
            tracing::trace!(target: "checkout", "Using {}", executable.display());
        }

        self.cache_root.ensure_initialized().await?;

        let result = match kind {
            VcsKind::Git { url } => {
                generic::checkout(&self.cache_root, &self.runner, &self.git, name, url).await
            }
            VcsKind::Directory { dir } => directory::checkout(&self.cache_root, name, dir).await,
        };

        let result = result.with_context(|| format!("Failed to check out '{name}' from {kind}"))?;
        tracing::debug!(
            target: "checkout",
            "'{name}' {} at {}",
            result.freshness,
            result.working_dir.display()
        );
        Ok(result)
    }
}

/// Creates the settings marker in a checkout when it has none.
fn ensure_settings_marker(working_dir: &Path) -> Result<()> {
    let marker = working_dir.join(crate::settings::SETTINGS_FILE);
    if !marker.exists() {
        tracing::trace!(target: "checkout", "Creating empty {}", marker.display());
    }
    crate::utils::touch(&marker)
}
