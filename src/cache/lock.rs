//! File-based locking for cache slots
//!
//! Each cache slot (a checkout directory, or the cache root itself) has a lock
//! file under `<user home>/.locks/`. Holding the OS-level exclusive lock on that
//! file gives exclusive ownership of the slot across processes.
//!
//! The first byte of the lock file is a write marker. An owner sets it to
//! *dirty* before mutating the slot and back to *clean* when done, flushing to
//! disk both times. A later owner that finds the marker dirty knows the
//! previous writer died mid-write and the slot content cannot be trusted.
//!
//! # Lock File Layout
//!
//! ```text
//! ~/.vcsdeps/
//! ├── .locks/
//! │   ├── cache.lock         # cache root
//! │   ├── gits-gradle.lock   # <user home>/gits/gradle
//! │   └── vcs-1f0e....lock   # <user home>/vcs/1f0e...
//! ├── gits/
//! └── vcs/
//! ```
//!
//! Lock files are never deleted; they are tiny and reused by every run.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const CLEAN: u8 = b'c';
const DIRTY: u8 = b'd';

/// Write marker found when a lock was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// The lock file was just created; no previous owner wrote anything.
    Fresh,
    /// The previous owner finished its writes.
    Clean,
    /// The previous owner started writing and never finished.
    Dirty,
}

impl LockState {
    /// Whether the slot content may be half-written.
    #[must_use]
    pub const fn is_dirty(self) -> bool {
        matches!(self, Self::Dirty)
    }
}

/// Exclusive lock on one cache slot, released on drop.
#[derive(Debug)]
pub struct CacheLock {
    file: File,
    path: PathBuf,
    previous: LockState,
}

impl CacheLock {
    /// Acquire the exclusive lock of `slot`, waiting as long as needed.
    ///
    /// Creates `<cache_dir>/.locks/` when missing. Blocking lock calls run on
    /// the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the locks directory or lock file cannot be created,
    /// or the OS refuses the lock.
    pub async fn acquire(cache_dir: &Path, slot: &str) -> Result<Self> {
        let locks_dir = cache_dir.join(".locks");
        tokio::fs::create_dir_all(&locks_dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotADirectory {
                anyhow::anyhow!(
                    "Cannot create directory: cache path is not a directory ({})",
                    cache_dir.display()
                )
            } else if e.kind() == std::io::ErrorKind::PermissionDenied {
                anyhow::anyhow!(
                    "Permission denied: cannot create locks directory at {}",
                    locks_dir.display()
                )
            } else {
                anyhow::anyhow!("Failed to create directory {}: {}", locks_dir.display(), e)
            }
        })?;

        let lock_path = locks_dir.join(format!("{slot}.lock"));
        let blocking_path = lock_path.clone();
        let slot = slot.to_string();

        tracing::debug!(target: "cache", "Waiting for lock {}", lock_path.display());

        let (file, previous) = tokio::task::spawn_blocking(move || -> Result<(File, LockState)> {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(&blocking_path)
                .with_context(|| format!("Failed to open lock file: {}", blocking_path.display()))?;

            file.lock_exclusive().with_context(|| format!("Failed to acquire lock for: {slot}"))?;

            let previous = read_marker(&mut file)
                .with_context(|| format!("Failed to read lock file: {}", blocking_path.display()))?;
            Ok((file, previous))
        })
        .await
        .context("Failed to spawn blocking task for lock acquisition")??;

        tracing::debug!(target: "cache", "Acquired lock {} (previous owner: {previous:?})", lock_path.display());

        Ok(Self {
            file,
            path: lock_path,
            previous,
        })
    }

    /// The lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Marker left by the previous owner.
    #[must_use]
    pub const fn previous_state(&self) -> LockState {
        self.previous
    }

    /// Record that slot content is about to change.
    pub fn mark_dirty(&mut self) -> Result<()> {
        self.write_marker(DIRTY)
    }

    /// Record that slot content is consistent again.
    pub fn mark_clean(&mut self) -> Result<()> {
        self.write_marker(CLEAN)
    }

    fn write_marker(&mut self, marker: u8) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&[marker])?;
        self.file.set_len(1)?;
        self.file
            .sync_all()
            .with_context(|| format!("Failed to flush lock file: {}", self.path.display()))
    }
}

fn read_marker(file: &mut File) -> std::io::Result<LockState> {
    let mut buf = Vec::with_capacity(1);
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut buf)?;
    Ok(match buf.first() {
        None => LockState::Fresh,
        Some(&CLEAN) => LockState::Clean,
        Some(_) => LockState::Dirty,
    })
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(target: "cache", "Failed to unlock {}: {}", self.path.display(), e);
        } else {
            tracing::debug!(target: "cache", "Released lock {}", self.path.display());
        }
    }
}
