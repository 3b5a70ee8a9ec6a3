//! `vcsdeps resolve`

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CommandContext;
use crate::mapping::DependencyCoordinate;
use crate::settings::{DefaultSettingsLoader, SettingsLoader};

/// Show which repositories provide the given coordinates.
#[derive(Args)]
pub struct ResolveCommand {
    /// Coordinates `group:module[:version]`. Defaults to the dependencies declared in the settings file.
    coordinates: Vec<String>,
}

impl ResolveCommand {
    pub(crate) async fn execute(self, context: &CommandContext) -> Result<()> {
        let settings = DefaultSettingsLoader::new()
            .find_and_load_settings(&context.settings_request()?)
            .await?;

        let coordinates = if self.coordinates.is_empty() {
            settings.dependencies().to_vec()
        } else {
            self.coordinates
                .iter()
                .map(|coordinate| coordinate.parse::<DependencyCoordinate>())
                .collect::<Result<Vec<_>, _>>()?
        };

        let resolved = settings.source_control().resolved_repositories_for(&coordinates);
        if resolved.is_empty() {
            println!("No repository provides the requested dependencies.");
            return Ok(());
        }

        for entry in resolved.iter() {
            println!("{} {}", entry.repository.name().green().bold(), entry.repository.kind());
            for mapping in &entry.mappings {
                let provides: Vec<String> = coordinates
                    .iter()
                    .filter(|coordinate| mapping.matches(coordinate))
                    .map(ToString::to_string)
                    .collect();
                if provides.is_empty() {
                    println!("    {mapping}");
                } else {
                    println!("    {mapping} provides {}", provides.join(", "));
                }
            }
        }

        Ok(())
    }
}
