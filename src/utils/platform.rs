//! Platform-specific helpers
//!
//! Home directory resolution and `~`/environment expansion of configured paths.
//!
//! ```rust,no_run
//! use vcsdeps::utils::platform::{get_home_dir, resolve_path};
//!
//! # fn example() -> anyhow::Result<()> {
//! let home = get_home_dir()?;
//! let user_home = resolve_path("~/.vcsdeps")?;
//! assert!(user_home.starts_with(&home));
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Returns true when compiled for Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Get the current user's home directory.
///
/// # Errors
///
/// Returns an error when the home directory cannot be determined (for example
/// when `HOME` is unset).
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Expand `~` and `$VAR`/`${VAR}` references in a configured path.
///
/// # Errors
///
/// Returns an error when a referenced environment variable is not set.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full_with_context(
        path,
        || dirs::home_dir().map(|home| home.to_string_lossy().into_owned()),
        |var| std::env::var(var).map(Some),
    )
    .map_err(|e| anyhow::anyhow!("Failed to expand path '{path}': {e}"))?;

    Ok(PathBuf::from(expanded.as_ref()))
}

/// Resolve a configured path against a base directory.
///
/// The path is expanded first; absolute results are returned unchanged.
///
/// # Errors
///
/// Returns an error when expansion fails.
pub fn resolve_against(base: &Path, path: &str) -> Result<PathBuf> {
    let expanded = resolve_path(path)?;
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(base.join(expanded))
    }
}
