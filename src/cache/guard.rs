//! Cross-process exclusive access to a cache slot
//!
//! [`CrossProcessCacheGuard`] wraps a [`CacheLock`] in a small state machine:
//!
//! ```text
//!          open() / with_lock()
//! Closed ─────────────────────────▶ Held
//!    ▲                                │
//!    └──────── close() / end of work ─┘
//! ```
//!
//! `open()` on a guard that is already `Held` is a programming error and fails
//! with [`VcsError::AlreadyOpen`]. `close()` is always safe to call.

use anyhow::Result;
use std::future::Future;
use std::path::{Path, PathBuf};

use super::lock::{CacheLock, LockState};
use crate::core::VcsError;

/// Decides whether a slot needs initialization and performs it.
///
/// Both methods run while the slot lock is held.
pub trait CacheInitializer: Send + Sync {
    /// Whether `initialize` must run. `previous` is the marker left by the
    /// previous lock owner.
    fn requires_initialization(&self, cache_dir: &Path, previous: LockState) -> bool;

    /// Initialize the slot.
    fn initialize(&self, cache_dir: &Path) -> Result<()>;
}

/// Exclusive lock on one cache slot with an initialization step.
#[derive(Debug)]
pub struct CrossProcessCacheGuard {
    display_name: String,
    cache_dir: PathBuf,
    slot: String,
    lock: Option<CacheLock>,
}

impl CrossProcessCacheGuard {
    /// Guard for `slot` under `cache_dir`. Nothing is locked until `open` or `with_lock`.
    pub fn new(display_name: impl Into<String>, cache_dir: impl Into<PathBuf>, slot: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            cache_dir: cache_dir.into(),
            slot: slot.into(),
            lock: None,
        }
    }

    /// Human readable name used in log messages.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The lock file this guard manages.
    #[must_use]
    pub fn lock_target(&self) -> PathBuf {
        self.cache_dir.join(".locks").join(format!("{}.lock", self.slot))
    }

    /// Whether the lock is currently held.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.lock.is_some()
    }

    /// Acquire the lock and keep it until [`close`](Self::close), running the
    /// initializer first when it asks for it.
    ///
    /// Initialization is bracketed by the dirty/clean write marker, so an
    /// initializer interrupted by a crash is seen as dirty by the next owner.
    /// If initialization fails the lock is released and the error returned.
    ///
    /// # Errors
    ///
    /// [`VcsError::AlreadyOpen`] when the guard is already held, lock
    /// acquisition errors, and initializer errors.
    pub async fn open<I: CacheInitializer>(&mut self, initializer: &I) -> Result<()> {
        self.ensure_closed()?;

        let mut lock = CacheLock::acquire(&self.cache_dir, &self.slot).await?;
        tracing::debug!(target: "cache", "Opened {}", self.display_name);

        if initializer.requires_initialization(&self.cache_dir, lock.previous_state()) {
            tracing::debug!(target: "cache", "Initializing {}", self.display_name);
            lock.mark_dirty()?;
            initializer.initialize(&self.cache_dir)?;
            lock.mark_clean()?;
        }

        self.lock = Some(lock);
        Ok(())
    }

    /// Release the lock. Does nothing when the guard is closed.
    pub fn close(&mut self) {
        if self.lock.take().is_some() {
            tracing::debug!(target: "cache", "Closed {}", self.display_name);
        }
    }

    /// Run `work` while holding the lock, releasing it on every exit path.
    ///
    /// `work` receives the marker left by the previous owner; [`LockState::Dirty`]
    /// means the slot may be half-written. The slot is marked dirty while `work`
    /// runs and clean only when it succeeds.
    ///
    /// # Errors
    ///
    /// [`VcsError::AlreadyOpen`] when the guard is already held, lock errors, and
    /// whatever `work` returns.
    pub async fn with_lock<F, Fut, T>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(LockState) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.ensure_closed()?;

        let mut lock = CacheLock::acquire(&self.cache_dir, &self.slot).await?;
        let previous = lock.previous_state();
        lock.mark_dirty()?;
        self.lock = Some(lock);

        let mut result = work(previous).await;

        if result.is_ok()
            && let Some(lock) = self.lock.as_mut()
            && let Err(e) = lock.mark_clean()
        {
            result = Err(e);
        }
        self.close();
        result
    }

    fn ensure_closed(&self) -> Result<(), VcsError> {
        if self.lock.is_some() {
            return Err(VcsError::AlreadyOpen {
                lock_target: self.lock_target(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingInitializer {
        runs: AtomicUsize,
    }

    impl CountingInitializer {
        fn new() -> Self {
            Self {
                runs: AtomicUsize::new(0),
            }
        }
    }

    impl CacheInitializer for CountingInitializer {
        fn requires_initialization(&self, cache_dir: &Path, previous: LockState) -> bool {
            previous.is_dirty() || !cache_dir.join("marker").exists()
        }

        fn initialize(&self, cache_dir: &Path) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            std::fs::write(cache_dir.join("marker"), "ok")?;
            Ok(())
        }
    }

    struct FailingInitializer;

    impl CacheInitializer for FailingInitializer {
        fn requires_initialization(&self, _: &Path, _: LockState) -> bool {
            true
        }

        fn initialize(&self, _: &Path) -> Result<()> {
            anyhow::bail!("initializer exploded")
        }
    }

    #[tokio::test]
    async fn test_open_twice_is_already_open() {
        let temp = TempDir::new().unwrap();
        let initializer = CountingInitializer::new();
        let mut guard = CrossProcessCacheGuard::new("test cache", temp.path(), "cache");

        guard.open(&initializer).await.unwrap();
        assert!(guard.is_open());

        let err = guard.open(&initializer).await.unwrap_err();
        let vcs_error = err.downcast_ref::<VcsError>().unwrap();
        assert!(matches!(vcs_error, VcsError::AlreadyOpen { lock_target } if *lock_target == temp.path().join(".locks/cache.lock")));

        guard.close();
        guard.close();
        assert!(!guard.is_open());
    }

    #[tokio::test]
    async fn test_initializer_runs_only_when_required() {
        let temp = TempDir::new().unwrap();
        let initializer = CountingInitializer::new();
        let mut guard = CrossProcessCacheGuard::new("test cache", temp.path(), "cache");

        guard.open(&initializer).await.unwrap();
        guard.close();
        guard.open(&initializer).await.unwrap();
        guard.close();

        assert_eq!(initializer.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_initialization_releases_and_leaves_dirty() {
        let temp = TempDir::new().unwrap();
        let mut guard = CrossProcessCacheGuard::new("test cache", temp.path(), "cache");

        let err = guard.open(&FailingInitializer).await.unwrap_err();
        assert!(err.to_string().contains("initializer exploded"));
        assert!(!guard.is_open());

        let lock = CacheLock::acquire(temp.path(), "cache").await.unwrap();
        assert_eq!(lock.previous_state(), LockState::Dirty);
    }

    #[tokio::test]
    async fn test_with_lock_releases_on_error_and_reports_dirty() {
        let temp = TempDir::new().unwrap();
        let mut guard = CrossProcessCacheGuard::new("slot", temp.path(), "gits-a");

        let result: Result<()> = guard
            .with_lock(|previous| async move {
                assert_eq!(previous, LockState::Fresh);
                anyhow::bail!("work failed")
            })
            .await;
        assert!(result.is_err());
        assert!(!guard.is_open());

        let previous = guard.with_lock(|previous| async move { Ok(previous) }).await.unwrap();
        assert_eq!(previous, LockState::Dirty);

        let previous = guard.with_lock(|previous| async move { Ok(previous) }).await.unwrap();
        assert_eq!(previous, LockState::Clean);
    }

    #[tokio::test]
    async fn test_with_lock_on_open_guard_fails() {
        let temp = TempDir::new().unwrap();
        let mut guard = CrossProcessCacheGuard::new("slot", temp.path(), "slot");
        guard.open(&CountingInitializer::new()).await.unwrap();

        let err = guard.with_lock(|_| async { Ok(()) }).await.unwrap_err();
        assert!(err.downcast_ref::<VcsError>().is_some());
        assert!(guard.is_open());
    }

    #[tokio::test]
    async fn test_guards_exclude_each_other() {
        use std::sync::Arc;
        use std::time::Duration;
        use tokio::sync::Mutex;

        let temp = TempDir::new().unwrap();
        let timeline = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for id in 0..2 {
            let dir = temp.path().to_path_buf();
            let timeline = timeline.clone();
            handles.push(tokio::spawn(async move {
                let mut guard = CrossProcessCacheGuard::new("shared", dir, "shared");
                guard
                    .with_lock(|_| async move {
                        timeline.lock().await.push(format!("start-{id}"));
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        timeline.lock().await.push(format!("end-{id}"));
                        Ok(())
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let timeline = timeline.lock().await;
        assert_eq!(timeline.len(), 4);
        // No interleaving: every start is immediately followed by its own end
        for pair in timeline.chunks(2) {
            assert_eq!(pair[0].replace("start", "end"), pair[1]);
        }
    }
}
