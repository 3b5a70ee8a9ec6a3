//! Cross-process guard exclusion and cache cleaning

use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

use vcsdeps::cache::{CacheRoot, CrossProcessCacheGuard, LockState};
use vcsdeps::checkout::{CheckoutEngine, Freshness};
use vcsdeps::repository::VcsKind;
use vcsdeps::test_utils::FakeVcsRunner;
use vcsdeps::vcs::VcsTool;

/// Guards on the same slot never run their work at the same time.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_slot_work_never_overlaps() -> Result<()> {
    let temp = TempDir::new()?;
    let dir = Arc::new(temp.path().to_path_buf());
    let active = Arc::new(AtomicUsize::new(0));
    let max_active = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let dir = dir.clone();
        let active = active.clone();
        let max_active = max_active.clone();
        handles.push(tokio::spawn(async move {
            let mut guard = CrossProcessCacheGuard::new("shared", dir.as_path(), "shared");
            guard
                .with_lock(|_| async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    max_active.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, anyhow::Error>(())
                })
                .await
        }));
    }

    for handle in handles {
        handle.await??;
    }

    assert_eq!(max_active.load(Ordering::SeqCst), 1);
    Ok(())
}

/// Work that fails leaves the slot dirty for the next holder.
#[tokio::test]
async fn test_failed_work_is_seen_as_dirty() -> Result<()> {
    let temp = TempDir::new()?;
    let mut guard = CrossProcessCacheGuard::new("slot", temp.path(), "slot");

    let result: Result<()> = guard
        .with_lock(|_| async { Err::<(), _>(anyhow::anyhow!("interrupted")) })
        .await;
    assert!(result.is_err());

    let previous = guard.with_lock(|previous| async move { Ok::<_, anyhow::Error>(previous) }).await?;
    assert_eq!(previous, LockState::Dirty);

    let previous = guard.with_lock(|previous| async move { Ok::<_, anyhow::Error>(previous) }).await?;
    assert_eq!(previous, LockState::Clean);

    Ok(())
}

/// Concurrent checkouts of one repository through separate engines clone exactly once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_engines_share_one_clone() -> Result<()> {
    let temp = TempDir::new()?;
    let home = temp.path().join("home");

    let mut handles = Vec::new();
    for _ in 0..3 {
        let home = home.clone();
        handles.push(tokio::spawn(async move {
            let engine = CheckoutEngine::new(CacheRoot::new(&home), FakeVcsRunner::new(), VcsTool::git("git"));
            engine.checkout("shared", &VcsKind::git("https://example.com/shared.git")).await
        }));
    }

    let mut freshness = Vec::new();
    for handle in handles {
        freshness.push(handle.await??.freshness);
    }

    assert_eq!(freshness.iter().filter(|f| **f == Freshness::Cloned).count(), 1);
    assert_eq!(freshness.iter().filter(|f| **f == Freshness::Updated).count(), 2);
    Ok(())
}

/// Cleaning removes checkouts of every kind but keeps the lock files.
#[tokio::test]
async fn test_clean_removes_checkouts() -> Result<()> {
    let temp = TempDir::new()?;
    let root = CacheRoot::new(temp.path().join("home"));
    let engine = CheckoutEngine::new(root.clone(), FakeVcsRunner::new(), VcsTool::git("git"));
    let source = temp.path().join("lib");
    std::fs::create_dir_all(&source)?;

    engine.checkout("a", &VcsKind::git("https://example.com/a.git")).await?;
    engine.checkout("b", &VcsKind::git("https://example.com/b.git")).await?;
    engine.checkout("lib", &VcsKind::directory(&source)).await?;

    assert_eq!(root.clean().await?, 3);
    assert!(!root.checkouts_dir("gits").exists());
    assert!(!root.directory_checkouts_dir().exists());
    assert!(root.path().join(".locks").is_dir());

    // Cleaning an already clean cache is a no-op.
    assert_eq!(root.clean().await?, 0);
    Ok(())
}
