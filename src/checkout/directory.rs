//! Copy strategy for local directory repositories

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{CheckoutResult, Freshness, ensure_settings_marker};
use crate::cache::CacheRoot;
use crate::core::VcsError;
use crate::core::file_error::{FileOperation, FileResultExt};
use crate::utils::stable_path_hash;

/// Absolute, existing source directory of repository `name`.
pub(super) fn absolute_source(name: &str, dir: &Path) -> Result<PathBuf> {
    let missing = || VcsError::SourceDirectoryMissing {
        repository: name.to_string(),
        path: dir.to_path_buf(),
    };

    if !dir.is_dir() {
        return Err(missing().into());
    }

    Ok(dir.canonicalize().with_file_context(
        FileOperation::Canonicalize,
        dir,
        "locating directory repository",
        "checkout::directory",
    )?)
}

pub(super) fn destination(cache_root: &CacheRoot, source: &Path) -> PathBuf {
    cache_root.directory_checkouts_dir().join(stable_path_hash(source))
}

pub(super) async fn checkout(cache_root: &CacheRoot, name: &str, dir: &Path) -> Result<CheckoutResult> {
    let source = absolute_source(name, dir)?;
    let destination = destination(cache_root, &source);
    let slot = format!("{}-{}", crate::cache::DIRECTORY_CHECKOUTS, stable_path_hash(&source));
    let mut guard = cache_root.guard_for_slot(&slot);

    guard
        .with_lock(|_| async move {
            tracing::info!(
                target: "checkout",
                "Copying '{name}' from {} to {}",
                source.display(),
                destination.display()
            );

            let working_dir = destination.clone();
            tokio::task::spawn_blocking(move || -> Result<()> {
                crate::utils::remove_path(&destination)?;
                crate::utils::copy_dir(&source, &destination)?;
                ensure_settings_marker(&destination)
            })
            .await
            .context("Failed to spawn blocking task for directory copy")??;

            Ok::<_, anyhow::Error>(CheckoutResult {
                working_dir,
                freshness: Freshness::Copied,
            })
        })
        .await
}
