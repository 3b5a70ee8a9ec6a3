//! Clone-or-update strategy for command-line VCS tools

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{CheckoutResult, Freshness, ensure_settings_marker};
use crate::cache::CacheRoot;
use crate::core::VcsError;
use crate::repository::validate_name;
use crate::vcs::{VcsCommand, VcsCommandRunner, VcsTool};

pub(super) fn destination(cache_root: &CacheRoot, tool: &VcsTool, name: &str) -> PathBuf {
    cache_root.checkouts_dir(tool.checkouts_dir()).join(name)
}

pub(super) async fn checkout<R: VcsCommandRunner>(
    cache_root: &CacheRoot,
    runner: &R,
    tool: &VcsTool,
    name: &str,
    url: &str,
) -> Result<CheckoutResult> {
    validate_name(name)?;

    let checkout_root = cache_root.checkouts_dir(tool.checkouts_dir());
    let destination = destination(cache_root, tool, name);
    let mut guard = cache_root.guard_for_slot(&format!("{}-{name}", tool.checkouts_dir()));

    guard
        .with_lock(|previous| async move {
            let exists = std::fs::symlink_metadata(&destination).is_ok();
            if exists && (previous.is_dirty() || !tool.is_valid_checkout(&destination)) {
                tracing::info!(
                    target: "checkout",
                    "Deleting corrupted cache for '{name}' at {}",
                    destination.display()
                );
                crate::utils::remove_path(&destination)?;
            }

            let freshness = if tool.is_valid_checkout(&destination) {
                tracing::info!(target: "checkout", "Pulling '{name}' from {url}");
                let command = tool.update_command(url, &destination).with_context(name);
                run(runner, &command, &destination).await?;
                Freshness::Updated
            } else {
                std::fs::create_dir_all(&checkout_root).map_err(|source| VcsError::CreateDirFailed {
                    path: checkout_root.clone(),
                    source,
                })?;
                tracing::info!(target: "checkout", "Cloning '{name}' from {url}");
                let command = tool.fetch_command(url, &destination, &checkout_root).with_context(name);
                run(runner, &command, &destination).await?;
                Freshness::Cloned
            };

            ensure_settings_marker(&destination)?;

            Ok::<_, anyhow::Error>(CheckoutResult {
                working_dir: destination,
                freshness,
            })
        })
        .await
}

async fn run<R: VcsCommandRunner>(runner: &R, command: &VcsCommand, destination: &Path) -> Result<()> {
    let output = runner.run(command).await?;
    if output.success() {
        return Ok(());
    }

    Err(VcsError::CheckoutFailed {
        command: command.command_line(),
        exit_code: output.exit_code,
        destination: destination.to_path_buf(),
        stderr: output.stderr,
    }
    .into())
}
