//! The vcsdeps user home: checkout directories and their locks
//!
//! # Cache Directory Structure
//!
//! ```text
//! ~/.vcsdeps/
//! ├── CACHEDIR.TAG     # marks the tree as a cache for backup tools
//! ├── gits/            # git checkouts, one per repository name
//! │   └── gradle/
//! ├── vcs/             # copies of directory repositories, keyed by path hash
//! │   └── 1f0e3dad99908345/
//! └── .locks/          # one lock file per slot, see [`lock`]
//! ```
//!
//! # Locking
//!
//! Every slot (a directory under `gits/` or `vcs/`) is written only while its
//! [`CrossProcessCacheGuard`] is held. The cache root has its own slot, taken
//! for initialization and for [`CacheRoot::clean`].
//!
//! ```rust,no_run
//! use vcsdeps::cache::CacheRoot;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let root = CacheRoot::new("/home/me/.vcsdeps");
//! root.ensure_initialized().await?;
//! let mut guard = root.guard_for_slot("gits-gradle");
//! guard.with_lock(|_previous| async { Ok(()) }).await?;
//! # Ok(())
//! # }
//! ```

pub mod guard;
pub mod lock;

pub use guard::{CacheInitializer, CrossProcessCacheGuard};
pub use lock::{CacheLock, LockState};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::core::file_error::{FileOperation, FileResultExt};

/// Slot name of the cache root lock.
pub const ROOT_SLOT: &str = "cache";

/// Name of the cache directory tag file.
pub const CACHEDIR_TAG: &str = "CACHEDIR.TAG";

const CACHEDIR_TAG_CONTENT: &str = "Signature: 8a477f597d28d172789f06886806bc55\n\
# This file is a cache directory tag created by vcsdeps.\n\
# For information about cache directory tags, see https://bford.info/cachedir/\n";

/// Directory name holding copies of directory repositories.
pub const DIRECTORY_CHECKOUTS: &str = "vcs";

/// Root of every checkout and lock file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRoot {
    dir: PathBuf,
}

impl CacheRoot {
    /// Cache rooted at `dir`. Nothing is created yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Directory holding checkouts of one VCS kind, e.g. `gits`.
    #[must_use]
    pub fn checkouts_dir(&self, kind_dir: &str) -> PathBuf {
        self.dir.join(kind_dir)
    }

    /// Directory holding copies of directory repositories.
    #[must_use]
    pub fn directory_checkouts_dir(&self) -> PathBuf {
        self.dir.join(DIRECTORY_CHECKOUTS)
    }

    /// Guard for one slot under this root.
    #[must_use]
    pub fn guard_for_slot(&self, slot: &str) -> CrossProcessCacheGuard {
        CrossProcessCacheGuard::new(format!("cache slot '{slot}'"), &self.dir, slot)
    }

    /// Create the root directory and its `CACHEDIR.TAG`, under the root lock.
    pub async fn ensure_initialized(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_file_context(
                FileOperation::CreateDir,
                &self.dir,
                "creating the vcsdeps user home",
                "cache::ensure_initialized",
            )?;

        let mut guard = CrossProcessCacheGuard::new("vcsdeps cache root", &self.dir, ROOT_SLOT);
        guard.open(&CacheDirTag).await?;
        guard.close();
        Ok(())
    }

    /// Delete every checkout under the root.
    ///
    /// Runs under the root lock, and removes each checkout while holding that
    /// checkout's own slot lock (`<kind>-<entry>`), so a clone, pull or copy in
    /// progress in another process finishes before its directory goes away.
    /// Returns how many checkout directories were removed. Lock files and the
    /// tag are kept.
    pub async fn clean(&self) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let root = self.clone();
        let mut guard = CrossProcessCacheGuard::new("vcsdeps cache root", &self.dir, ROOT_SLOT);
        guard
            .with_lock(|_| async move {
                let mut removed = 0;
                let mut kinds = tokio::fs::read_dir(&root.dir)
                    .await
                    .with_context(|| format!("Failed to read cache directory {}", root.dir.display()))?;

                while let Some(kind) = kinds.next_entry().await? {
                    let kind_name = kind.file_name().to_string_lossy().into_owned();
                    if kind_name == ".locks" || !kind.file_type().await?.is_dir() {
                        continue;
                    }

                    let mut checkouts = tokio::fs::read_dir(kind.path()).await?;
                    while let Some(checkout) = checkouts.next_entry().await? {
                        let slot = format!("{kind_name}-{}", checkout.file_name().to_string_lossy());
                        let path = checkout.path();
                        root.guard_for_slot(&slot)
                            .with_lock(|_| async move {
                                tracing::info!(target: "cache", "Removing {}", path.display());
                                crate::utils::remove_path(&path)
                            })
                            .await?;
                        removed += 1;
                    }

                    // A checkout started after the listing keeps its parent.
                    if let Err(e) = tokio::fs::remove_dir(kind.path()).await {
                        tracing::debug!(target: "cache", "Keeping {}: {e}", kind.path().display());
                    }
                }

                Ok::<_, anyhow::Error>(removed)
            })
            .await
    }
}

/// Writes `CACHEDIR.TAG` into the cache root when missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheDirTag;

impl CacheInitializer for CacheDirTag {
    fn requires_initialization(&self, cache_dir: &Path, previous: LockState) -> bool {
        previous.is_dirty() || !cache_dir.join(CACHEDIR_TAG).is_file()
    }

    fn initialize(&self, cache_dir: &Path) -> Result<()> {
        let tag = cache_dir.join(CACHEDIR_TAG);
        std::fs::write(&tag, CACHEDIR_TAG_CONTENT).with_file_context(
            FileOperation::Write,
            &tag,
            "tagging the cache directory",
            "cache::CacheDirTag",
        )?;
        tracing::debug!(target: "cache", "Wrote {}", tag.display());
        Ok(())
    }
}
