//! Test utilities for vcsdeps
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite.
//!
//! - [`init_test_logging`] installs a tracing subscriber once per process
//! - [`FakeVcsRunner`] stands in for the git executable
//! - [`SettingsFixture`] writes `settings.toml` files
//!
//! # Example
//!
//! ```rust,no_run
//! use vcsdeps::test_utils::{FakeVcsRunner, SettingsFixture};
//!
//! # fn example() -> anyhow::Result<()> {
//! let temp = tempfile::TempDir::new()?;
//! SettingsFixture::new()
//!     .git_repository("gradle", "https://github.com/gradle/gradle")
//!     .write_to(temp.path())?;
//! let runner = FakeVcsRunner::new();
//! # Ok(())
//! # }
//! ```

pub mod fake_runner;
pub mod fixtures;

pub use fake_runner::FakeVcsRunner;
pub use fixtures::SettingsFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=checkout=debug,vcs=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
