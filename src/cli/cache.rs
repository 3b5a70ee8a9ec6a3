//! `vcsdeps cache`

use anyhow::Result;
use clap::{Args, Subcommand};

use super::CommandContext;

/// Inspect or clean the checkout cache.
#[derive(Args)]
pub struct CacheCommand {
    #[command(subcommand)]
    command: CacheSubcommands,
}

#[derive(Subcommand)]
enum CacheSubcommands {
    /// Print the user home holding checkouts
    Path,

    /// Delete every checkout, keeping lock files
    Clean,
}

impl CacheCommand {
    pub(crate) async fn execute(self, context: &CommandContext) -> Result<()> {
        let config = context.global_config().await?;
        let cache_root = context.cache_root(&config)?;

        match self.command {
            CacheSubcommands::Path => {
                println!("{}", cache_root.path().display());
            }
            CacheSubcommands::Clean => {
                let removed = cache_root.clean().await?;
                println!("Removed {removed} checkout(s) from {}", cache_root.path().display());
            }
        }

        Ok(())
    }
}
