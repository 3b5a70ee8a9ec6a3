//! vcsdeps CLI entry point
//!
//! Parses arguments, runs the selected command and renders errors with
//! suggestions. Commands:
//! - `checkout` - Check out sources and list the included builds
//! - `resolve` - Show the repositories resolved for dependency coordinates
//! - `cache` - Show or clean the checkout cache

use anyhow::Result;
use clap::Parser;
use vcsdeps::cli;
use vcsdeps::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
