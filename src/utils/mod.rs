//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`fs`] - Directory creation, recursive copy and removal, stable path hashing
//! - [`platform`] - Home directory lookup and `~` expansion
//!
//! # Example
//!
//! ```rust,no_run
//! use vcsdeps::utils::{copy_dir, ensure_dir};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! ensure_dir(Path::new("cache/vcs"))?;
//! copy_dir(Path::new("../shared"), Path::new("cache/vcs/0123abcd"))?;
//! # Ok(())
//! # }
//! ```

pub mod fs;
pub mod platform;

pub use fs::{copy_dir, ensure_dir, find_upwards, remove_path, stable_path_hash, touch};
pub use platform::{get_home_dir, is_windows, resolve_path};
