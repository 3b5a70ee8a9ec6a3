//! `vcsdeps checkout`

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CommandContext;
use crate::settings::{SettingsLoader, default_chain};

/// Check out every source the build needs and list the included builds.
#[derive(Args)]
pub struct CheckoutCommand {}

impl CheckoutCommand {
    pub(crate) async fn execute(self, context: &CommandContext) -> Result<()> {
        let engine = context.engine().await?;
        let request = context.settings_request()?;

        let settings = default_chain(engine).find_and_load_settings(&request).await?;

        let builds = settings.included_builds();
        if builds.is_empty() {
            println!("No builds included: nothing to check out.");
            return Ok(());
        }

        println!("{}", format!("Included {} build(s):", builds.len()).bold());
        for build in builds {
            println!(
                "  {} {} ({})",
                build.name.green(),
                build.root_dir.display(),
                build.origin
            );
            for rule in build.substitutions.rules() {
                println!("      {rule}");
            }
        }

        Ok(())
    }
}
