//! Builders for `settings.toml` files

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::settings::SETTINGS_FILE;

/// Builds the text of a settings file entry by entry.
#[derive(Clone, Debug, Default)]
pub struct SettingsFixture {
    dependencies: Vec<String>,
    body: String,
}

impl SettingsFixture {
    /// Empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical scenario: repository `gradle` mapped to
    /// `org.gradle:tooling-api`, which the build depends on.
    #[must_use]
    pub fn gradle() -> Self {
        Self::new()
            .dependency("org.gradle:tooling-api:1.0")
            .git_repository("gradle", "https://github.com/gradle/gradle")
            .maven_mapping("gradle", "org.gradle:tooling-api")
    }

    /// Add an unresolved dependency.
    #[must_use]
    pub fn dependency(mut self, coordinate: &str) -> Self {
        self.dependencies.push(coordinate.to_string());
        self
    }

    /// Add a git repository.
    #[must_use]
    pub fn git_repository(mut self, name: &str, url: &str) -> Self {
        let _ = write!(self.body, "\n[[repositories]]\nname = \"{name}\"\nkind = \"git\"\nurl = \"{url}\"\n");
        self
    }

    /// Add a directory repository.
    #[must_use]
    pub fn directory_repository(mut self, name: &str, dir: &Path) -> Self {
        let _ = write!(
            self.body,
            "\n[[repositories]]\nname = \"{name}\"\nkind = \"directory\"\ndir = '{}'\n",
            dir.display()
        );
        self
    }

    /// Map a `group:module` to a repository.
    #[must_use]
    pub fn maven_mapping(mut self, repository: &str, module: &str) -> Self {
        let _ = write!(self.body, "\n[[vcs-mappings]]\nrepository = \"{repository}\"\nmaven = \"{module}\"\n");
        self
    }

    /// Add a git ScmBuild with `(module, project)` substitutions.
    #[must_use]
    pub fn git_scm_build(mut self, name: &str, url: &str, substitutions: &[(&str, &str)]) -> Self {
        let _ = write!(self.body, "\n[[scm-builds]]\nname = \"{name}\"\ngit = \"{url}\"\n");
        self.push_substitutions(substitutions);
        self
    }

    /// Add a directory ScmBuild with `(module, project)` substitutions.
    #[must_use]
    pub fn directory_scm_build(mut self, name: &str, dir: &Path, substitutions: &[(&str, &str)]) -> Self {
        let _ = write!(self.body, "\n[[scm-builds]]\nname = \"{name}\"\ndir = '{}'\n", dir.display());
        self.push_substitutions(substitutions);
        self
    }

    fn push_substitutions(&mut self, substitutions: &[(&str, &str)]) {
        for (module, project) in substitutions {
            let _ = write!(
                self.body,
                "\n[[scm-builds.substitutions]]\nmodule = \"{module}\"\nproject = \"{project}\"\n"
            );
        }
    }

    /// The settings file text.
    #[must_use]
    pub fn content(&self) -> String {
        let dependencies: Vec<String> = self.dependencies.iter().map(|d| format!("\"{d}\"")).collect();
        format!("dependencies = [{}]\n{}", dependencies.join(", "), self.body)
    }

    /// Write `settings.toml` into `dir`, returning its path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create fixture directory {}", dir.display()))?;
        let path = dir.join(SETTINGS_FILE);
        std::fs::write(&path, self.content())
            .with_context(|| format!("Failed to write fixture {}", path.display()))?;
        Ok(path)
    }
}
