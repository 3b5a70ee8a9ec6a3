//! Command-line interface for vcsdeps
//!
//! # Commands
//!
//! - `checkout` - Load the settings, check out every ScmBuild and every
//!   repository resolved for an unsatisfied dependency, and list the included builds
//! - `resolve` - Show which repositories provide the given coordinates, without checking out
//! - `cache` - Show or clean the user home holding checkouts
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Only report errors
//! - `--settings <FILE>` - Use this settings file instead of searching for `settings.toml`
//! - `--user-home <DIR>` - Where checkouts live (default `~/.vcsdeps`)
//! - `--config <FILE>` - Global config file (default `~/.vcsdeps/config.toml`)
//!
//! # Example
//!
//! ```bash
//! vcsdeps checkout
//! vcsdeps --verbose resolve org.gradle:tooling-api:1.0
//! vcsdeps cache clean
//! ```

mod cache;
mod checkout;
mod resolve;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::cache::CacheRoot;
use crate::checkout::CheckoutEngine;
use crate::config::{GlobalConfig, get_user_home};
use crate::settings::SettingsRequest;
use crate::vcs::{SystemCommandRunner, VcsTool};

/// Main CLI structure for vcsdeps.
#[derive(Parser)]
#[command(
    name = "vcsdeps",
    about = "Check out source repositories for dependencies a build cannot resolve",
    version,
    long_about = "vcsdeps maps unresolved dependencies to source repositories, checks them out into a shared cache and folds them into the build as included builds."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Settings file to load instead of searching upwards for settings.toml.
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Directory holding checkouts and locks.
    #[arg(long, global = true, value_name = "DIR")]
    user_home: Option<PathBuf>,

    /// Global configuration file.
    #[arg(short, long, global = true, value_name = "FILE", env = "VCSDEPS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check out sources and list the included builds
    Checkout(checkout::CheckoutCommand),

    /// Show the repositories resolved for dependency coordinates
    Resolve(resolve::ResolveCommand),

    /// Manage the checkout cache
    Cache(cache::CacheCommand),
}

/// Everything a command needs besides its own arguments.
pub(crate) struct CommandContext {
    settings: Option<PathBuf>,
    user_home: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl CommandContext {
    /// Where to look for the settings file.
    pub(crate) fn settings_request(&self) -> Result<SettingsRequest> {
        Ok(match &self.settings {
            Some(file) => SettingsRequest::explicit(file),
            None => SettingsRequest::discover(std::env::current_dir()?),
        })
    }

    pub(crate) async fn global_config(&self) -> Result<GlobalConfig> {
        GlobalConfig::load_with_optional(self.config.clone()).await
    }

    pub(crate) fn cache_root(&self, config: &GlobalConfig) -> Result<CacheRoot> {
        Ok(CacheRoot::new(get_user_home(self.user_home.as_deref(), config)?))
    }

    pub(crate) async fn engine(&self) -> Result<Arc<CheckoutEngine<SystemCommandRunner>>> {
        let config = self.global_config().await?;
        let cache_root = self.cache_root(&config)?;
        tracing::debug!("Using user home {}", cache_root.path().display());
        Ok(Arc::new(CheckoutEngine::new(
            cache_root,
            SystemCommandRunner::new(),
            VcsTool::git_from_config(&config.git),
        )))
    }
}

impl Cli {
    /// Run the selected command.
    pub async fn execute(self) -> Result<()> {
        self.init_logging();

        let context = CommandContext {
            settings: self.settings,
            user_home: self.user_home,
            config: self.config,
        };

        match self.command {
            Commands::Checkout(cmd) => cmd.execute(&context).await,
            Commands::Resolve(cmd) => cmd.execute(&context).await,
            Commands::Cache(cmd) => cmd.execute(&context).await,
        }
    }

    /// Log level selected by the flags, overridden by `RUST_LOG`.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.log_level())
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(self.verbose)
            .without_time()
            .try_init();
    }
}
