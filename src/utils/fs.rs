//! File system helpers used by the checkout and cache layers
//!
//! All functions are synchronous; async callers run them through
//! `tokio::task::spawn_blocking` or accept the short blocking call, matching
//! the blocking model of checkouts.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::file_error::{FileOperation, FileResultExt};

/// Ensures a directory exists, creating it and all parents if needed.
///
/// # Errors
///
/// Returns an error if the path exists but is not a directory, or if the
/// directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).with_context(|| {
            let platform_help = if crate::utils::platform::is_windows() {
                "On Windows: Check that the path length is < 260 chars or that long path support is enabled"
            } else {
                "Check directory permissions and path validity"
            };

            format!("Failed to create directory: {}\n\n{}", path.display(), platform_help)
        })?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Recursively copies a directory tree.
///
/// Files and directories are copied; symbolic links are recreated in the
/// destination with the same target, so relative links keep pointing inside
/// the copy. Existing files in the destination are overwritten.
///
/// ```rust,no_run
/// use vcsdeps::utils::fs::copy_dir;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// copy_dir(Path::new("../shared"), Path::new("/tmp/shared-copy"))?;
/// # Ok(())
/// # }
/// ```
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    ensure_dir(dst)?;

    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to read directory: {}", src.display()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("Entry {} escaped {}", entry.path().display(), src.display()))?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else if file_type.is_dir() {
            ensure_dir(&target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target).with_file_context(
                FileOperation::Copy,
                entry.path(),
                format!("copying to {}", target.display()),
                "utils::fs::copy_dir",
            )?;
        }
    }

    Ok(())
}

/// Recreates the symlink `link` at `target`, pointing where `link` points.
fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    let destination = fs::read_link(link).with_file_context(
        FileOperation::Read,
        link,
        "reading symlink target",
        "utils::fs::copy_dir",
    )?;
    remove_path(target)?;

    #[cfg(unix)]
    let created = std::os::unix::fs::symlink(&destination, target);

    #[cfg(windows)]
    let created = if link.is_dir() {
        std::os::windows::fs::symlink_dir(&destination, target)
    } else {
        std::os::windows::fs::symlink_file(&destination, target)
    };

    created.with_file_context(
        FileOperation::Copy,
        link,
        format!("recreating symlink at {}", target.display()),
        "utils::fs::copy_dir",
    )?;
    Ok(())
}

/// Removes a path of any kind: a directory tree, a file or a symlink.
///
/// Missing paths are not an error. A symlink is removed itself, never its target.
pub fn remove_path(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e)
                .with_file_context(FileOperation::Metadata, path, "inspecting before removal", "utils::fs::remove_path")
                .map_err(Into::into);
        }
    };

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.with_file_context(FileOperation::Remove, path, "removing stale content", "utils::fs::remove_path")?;
    Ok(())
}

/// Creates an empty file when none exists. Existing content is left untouched.
pub fn touch(path: &Path) -> Result<()> {
    if path.is_file() {
        return Ok(());
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    Ok(())
}

/// Stable, filesystem-safe key for a path: the first 16 hex digits of the
/// SHA-256 of its string form.
///
/// The same absolute path always yields the same key, across processes and runs.
#[must_use]
pub fn stable_path_hash(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Walks up from `start` looking for a file named `file_name`.
///
/// Returns the full path of the first match.
#[must_use]
pub fn find_upwards(start: &Path, file_name: &str) -> Option<PathBuf> {
    start.ancestors().map(|dir| dir.join(file_name)).find(|candidate| candidate.is_file())
}
