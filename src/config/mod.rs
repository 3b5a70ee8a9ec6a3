//! Configuration for vcsdeps
//!
//! The only persistent location vcsdeps writes to is the *user home*, which
//! holds every checkout and lock file:
//!
//! ```text
//! <user home>/
//! ├── CACHEDIR.TAG
//! ├── .locks/        lock files, one per cache slot
//! ├── gits/<name>/   git checkouts
//! └── vcs/<hash>/    copies of directory repositories
//! ```
//!
//! # Resolution order
//!
//! 1. `VCSDEPS_USER_HOME` environment variable
//! 2. `--user-home` command line flag
//! 3. `user_home` in the global config file
//! 4. `~/.vcsdeps`

mod global;

pub use global::{GitConfig, GlobalConfig};

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Environment variable overriding the user home.
pub const USER_HOME_ENV: &str = "VCSDEPS_USER_HOME";

/// Determine the user home directory.
///
/// The directory is not created here; [`crate::cache::CacheRoot`] does that
/// under its lock.
pub fn get_user_home(cli_override: Option<&Path>, config: &GlobalConfig) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(USER_HOME_ENV)
        && !dir.is_empty()
    {
        return crate::utils::resolve_path(&dir);
    }

    if let Some(dir) = cli_override {
        return Ok(dir.to_path_buf());
    }

    if let Some(dir) = &config.user_home {
        return crate::utils::resolve_path(dir);
    }

    Ok(crate::utils::get_home_dir()?.join(".vcsdeps"))
}
