//! `settings.toml` parsing
//!
//! ```toml
//! # Dependencies the build could not resolve from binary repositories
//! dependencies = ["org.gradle:tooling-api:1.0"]
//!
//! [[repositories]]
//! name = "gradle"
//! kind = "git"
//! url = "https://github.com/gradle/gradle"
//!
//! [[repositories]]
//! name = "shared"
//! kind = "directory"
//! dir = "../shared"          # relative to the directory of this file
//!
//! [[vcs-mappings]]
//! repository = "gradle"
//! maven = "org.gradle:tooling-api"
//!
//! [[scm-builds]]
//! name = "tooling"
//! git = "https://example.com/tooling.git"   # or: dir = "../tooling"
//!
//! [[scm-builds.substitutions]]
//! module = "org.example:tooling"
//! project = ":tooling"
//! ```
//!
//! A mapping may use `descriptor = "group:module"` instead of `maven` for an
//! opaque mapping. Entries are applied in file order through the same
//! registration calls as the programmatic API, so a duplicated repository or
//! mapping fails exactly like it would in code.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::{ScmBuild, Settings};
use crate::core::VcsError;
use crate::mapping::{DependencyCoordinate, DependencyMapping};
use crate::repository::VcsKind;
use crate::utils::platform::resolve_against;

/// Raw deserialized settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SettingsFile {
    /// Unresolved dependency coordinates
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Repository declarations
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
    /// Mapping declarations
    #[serde(default)]
    pub vcs_mappings: Vec<MappingEntry>,
    /// ScmBuild declarations
    #[serde(default)]
    pub scm_builds: Vec<ScmBuildEntry>,
}

/// VCS kinds accepted in `[[repositories]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    /// `kind = "git"`, requires `url`
    Git,
    /// `kind = "directory"`, requires `dir`
    Directory,
}

/// One `[[repositories]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryEntry {
    /// Unique repository name
    pub name: String,
    /// VCS kind
    pub kind: RepositoryKind,
    /// Clone URL of git repositories
    pub url: Option<String>,
    /// Source directory of directory repositories
    pub dir: Option<String>,
}

/// One `[[vcs-mappings]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingEntry {
    /// Target repository name
    pub repository: String,
    /// Maven `group:module`
    pub maven: Option<String>,
    /// Opaque descriptor
    pub descriptor: Option<String>,
}

/// One `[[scm-builds]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScmBuildEntry {
    /// Build name
    pub name: String,
    /// Git URL
    pub git: Option<String>,
    /// Local directory
    pub dir: Option<String>,
    /// Substitution rules, applied in order
    #[serde(default)]
    pub substitutions: Vec<SubstitutionEntry>,
}

/// One `[[scm-builds.substitutions]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubstitutionEntry {
    /// `group:module` to replace
    pub module: String,
    /// Project path providing it
    pub project: String,
}

impl SettingsFile {
    /// Parse settings text; `file` is only used in error messages.
    pub fn parse(content: &str, file: &Path) -> Result<Self, VcsError> {
        toml::from_str(content).map_err(|e| VcsError::SettingsParseError {
            file: file.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read and parse a settings file.
    pub async fn read(file: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read settings file {}", file.display()))?;
        Ok(Self::parse(&content, file)?)
    }

    /// Evaluate the file into a [`Settings`] model for the build rooted next to `file`.
    pub fn into_settings(self, file: &Path) -> Result<Settings> {
        let mut settings = Settings::new(file);
        let root_dir = settings.root_dir().to_path_buf();

        for coordinate in &self.dependencies {
            settings.add_dependency(coordinate.parse::<DependencyCoordinate>()?);
        }

        let repositories = self
            .repositories
            .into_iter()
            .map(|entry| {
                let kind = entry.vcs_kind(&root_dir)?;
                Ok((entry.name, kind))
            })
            .collect::<Result<Vec<_>>>()?;
        settings.source_control_mut().configure_repositories(|registry| {
            for (name, kind) in repositories {
                registry.register(name, kind)?;
            }
            Ok(())
        })?;

        let mappings = self
            .vcs_mappings
            .into_iter()
            .map(|entry| Ok((entry.repository.clone(), entry.mapping()?)))
            .collect::<Result<Vec<_>, VcsError>>()?;
        settings.source_control_mut().vcs_mappings(|handler| {
            for (repository, mapping) in mappings {
                handler.add(&repository, mapping)?;
            }
            Ok(())
        })?;

        for entry in self.scm_builds {
            let source = entry.vcs_kind(&root_dir)?;
            let mut build = ScmBuild::new(entry.name, source);
            for substitution in entry.substitutions {
                build.substitute(substitution.module, substitution.project);
            }
            settings.add_scm_build(build)?;
        }

        tracing::debug!(
            target: "settings",
            "Loaded {}: {} repositories, {} mappings, {} scm builds, {} dependencies",
            file.display(),
            settings.source_control().repositories().len(),
            settings.source_control().repository_to_mappings().iter().map(|r| r.mappings.len()).sum::<usize>(),
            settings.scm_builds().len(),
            settings.dependencies().len()
        );

        Ok(settings)
    }
}

impl RepositoryEntry {
    fn vcs_kind(&self, root_dir: &Path) -> Result<VcsKind> {
        let invalid = |message: String| VcsError::ConfigError { message };
        match (self.kind, &self.url, &self.dir) {
            (RepositoryKind::Git, Some(url), None) => Ok(VcsKind::git(url.clone())),
            (RepositoryKind::Directory, None, Some(dir)) => {
                Ok(VcsKind::directory(resolve_against(root_dir, dir)?))
            }
            (RepositoryKind::Git, ..) => Err(invalid(format!(
                "git repository '{}' needs 'url' and no 'dir'",
                self.name
            ))
            .into()),
            (RepositoryKind::Directory, ..) => Err(invalid(format!(
                "directory repository '{}' needs 'dir' and no 'url'",
                self.name
            ))
            .into()),
        }
    }
}

impl MappingEntry {
    fn mapping(&self) -> Result<DependencyMapping, VcsError> {
        match (&self.maven, &self.descriptor) {
            (Some(maven), None) => DependencyMapping::parse_maven(maven),
            (None, Some(descriptor)) => Ok(DependencyMapping::Opaque(descriptor.clone())),
            _ => Err(VcsError::ConfigError {
                message: format!(
                    "mapping for repository '{}' needs exactly one of 'maven' or 'descriptor'",
                    self.repository
                ),
            }),
        }
    }
}

impl ScmBuildEntry {
    fn vcs_kind(&self, root_dir: &Path) -> Result<VcsKind> {
        match (&self.git, &self.dir) {
            (Some(url), None) => Ok(VcsKind::git(url.clone())),
            (None, Some(dir)) => Ok(VcsKind::directory(resolve_against(root_dir, dir)?)),
            _ => Err(VcsError::ConfigError {
                message: format!("scm build '{}' needs exactly one of 'git' or 'dir'", self.name),
            }
            .into()),
        }
    }
}
