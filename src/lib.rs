//! vcsdeps - source dependencies for builds
//!
//! vcsdeps lets a build declare that some of its dependencies are produced by
//! source repositories instead of binary artifacts. When such a dependency cannot
//! be resolved, the repository that provides it is checked out into a shared
//! per-user cache and folded into the build as an *included build*.
//!
//! # Architecture Overview
//!
//! - A build's `settings.toml` declares repositories, the mappings from dependency
//!   coordinates to those repositories, explicit ScmBuilds and declared dependencies
//! - [`settings::SettingsLoader`] implementations are chained: the base loader evaluates
//!   the file, then decorators check out ScmBuilds and resolved repositories
//! - Every checkout goes through [`checkout::CheckoutEngine`], which serializes work per
//!   destination with a [`cache::CrossProcessCacheGuard`]
//!
//! ## Cache layout
//!
//! ```text
//! ~/.vcsdeps/
//! ├── CACHEDIR.TAG
//! ├── .locks/          # one lock file per slot
//! ├── gits/<name>/     # git checkouts
//! └── vcs/<hash>/      # copies of local directory repositories
//! ```
//!
//! # Modules
//!
//! - [`repository`] - Repository declarations and the registry holding them
//! - [`mapping`] - Dependency coordinates and the mapping table
//! - [`source_control`] - Repository registry plus mappings, and resolution queries
//! - [`vcs`] - External VCS command construction and execution
//! - [`checkout`] - Git clone/pull and directory copies into the cache
//! - [`cache`] - Cache root and cross-process locking
//! - [`settings`] - Settings model, file format and the loader chain
//! - [`config`] - Global configuration (`~/.vcsdeps/config.toml`)
//! - [`core`] - Error types and user-facing error formatting
//! - [`cli`] - Command-line interface
//! - [`utils`] - File system and platform helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vcsdeps::cache::CacheRoot;
//! use vcsdeps::checkout::CheckoutEngine;
//! use vcsdeps::settings::{SettingsLoader, SettingsRequest, default_chain};
//! use vcsdeps::vcs::{SystemCommandRunner, VcsTool};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let engine = Arc::new(CheckoutEngine::new(
//!     CacheRoot::new("/home/me/.vcsdeps"),
//!     SystemCommandRunner::new(),
//!     VcsTool::git("git"),
//! ));
//! let settings = default_chain(engine)
//!     .find_and_load_settings(&SettingsRequest::discover("."))
//!     .await?;
//! for build in settings.included_builds() {
//!     println!("{} -> {}", build.name, build.root_dir.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod checkout;
pub mod cli;
pub mod config;
pub mod core;
pub mod mapping;
pub mod repository;
pub mod settings;
pub mod source_control;
pub mod utils;
pub mod vcs;

// test_utils is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
