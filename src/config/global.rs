//! Global configuration file (`~/.vcsdeps/config.toml`)
//!
//! ```toml
//! # Where checkouts, copies and lock files live
//! user_home = "~/.cache/vcsdeps"
//!
//! [git]
//! executable = "/usr/local/bin/git"
//! ```
//!
//! Every field is optional; a missing file is the same as an empty one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Settings for the git tool.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GitConfig {
    /// Executable name or path. Looked up on `PATH` when not absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
}

/// Global vcsdeps configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Overrides the default user home (`~/.vcsdeps`). `~` is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_home: Option<String>,

    /// Git tool settings.
    #[serde(default)]
    pub git: GitConfig,
}

impl GlobalConfig {
    /// Load from an explicit path, or from [`Self::default_path`] when `None`.
    ///
    /// A missing file yields the default configuration.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!(target: "config", "No global config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load and parse a config file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// `~/.vcsdeps/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        Ok(crate::utils::get_home_dir()?.join(".vcsdeps").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_full_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "user_home = \"/srv/vcsdeps\"\n\n[git]\nexecutable = \"/opt/git/bin/git\"\n",
        )
        .unwrap();

        let config = GlobalConfig::load_from(&path).await.unwrap();
        assert_eq!(config.user_home.as_deref(), Some("/srv/vcsdeps"));
        assert_eq!(config.git.executable.as_deref(), Some("/opt/git/bin/git"));
    }

    #[tokio::test]
    async fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config =
            GlobalConfig::load_with_optional(Some(temp.path().join("absent.toml"))).await.unwrap();
        assert_eq!(config, GlobalConfig::default());
    }

    #[tokio::test]
    async fn test_unknown_field_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "cache_dir = \"/tmp\"\n").unwrap();

        let err = GlobalConfig::load_from(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse global config"));
    }
}
