//! The settings model a build is configured from
//!
//! [`Settings`] is produced by the [loader chain](loader) from a
//! `settings.toml` file (see [`file`] for the format). It holds:
//!
//! - the [`SourceControl`] configuration (repositories and mappings),
//! - the declared [`ScmBuild`]s, consumed once by the chain,
//! - the dependencies the build could not resolve on its own,
//! - the [`IncludedBuild`]s registered so far, each with its
//!   [`DependencySubstitutions`].

pub mod file;
pub mod loader;
pub mod scm_build;

pub use loader::{
    DeclaredDependencies, DefaultChain, DefaultSettingsLoader, ScmBuildSettingsLoader, SettingsLoader,
    SettingsRequest, SourceControlSettingsLoader, UnresolvedDependencies, default_chain,
};
pub use scm_build::{ScmBuild, SubstitutionAction};

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::VcsError;
use crate::mapping::DependencyCoordinate;
use crate::source_control::SourceControl;

/// Name of the settings file, also the marker of an includable build root.
pub const SETTINGS_FILE: &str = "settings.toml";

/// A rule replacing an external module with a project of an included build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// `group:module` being replaced
    pub module: String,
    /// Project path inside the included build, e.g. `:tooling`
    pub project: String,
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> project {}", self.module, self.project)
    }
}

/// Ordered substitution rules of one included build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySubstitutions {
    rules: Vec<Substitution>,
}

impl DependencySubstitutions {
    /// Replace `module` (`group:module`) with `project`.
    pub fn substitute(&mut self, module: impl Into<String>, project: impl Into<String>) -> &mut Self {
        self.rules.push(Substitution {
            module: module.into(),
            project: project.into(),
        });
        self
    }

    /// Rules in the order they were added.
    #[must_use]
    pub fn rules(&self) -> &[Substitution] {
        &self.rules
    }

    /// Whether some rule replaces the coordinate's module.
    #[must_use]
    pub fn provides(&self, coordinate: &DependencyCoordinate) -> bool {
        let module_id = coordinate.module_id();
        self.rules.iter().any(|rule| rule.module == module_id)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Which part of the loader chain contributed an included build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOrigin {
    /// Declared as an ScmBuild with this name.
    ScmBuild(String),
    /// Repository resolved for an unsatisfied dependency.
    Repository(String),
}

impl fmt::Display for BuildOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScmBuild(name) => write!(f, "scm build '{name}'"),
            Self::Repository(name) => write!(f, "repository '{name}'"),
        }
    }
}

/// A checkout folded into the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedBuild {
    /// File name of the root directory
    pub name: String,
    /// Root directory of the build
    pub root_dir: PathBuf,
    /// Substitution rules contributed by the build
    pub substitutions: DependencySubstitutions,
    /// What caused the build to be included
    pub origin: BuildOrigin,
}

/// Populated settings of one build.
#[derive(Debug)]
pub struct Settings {
    root_dir: PathBuf,
    settings_file: PathBuf,
    source_control: SourceControl,
    scm_builds: Vec<ScmBuild>,
    dependencies: Vec<DependencyCoordinate>,
    included_builds: Vec<IncludedBuild>,
}

impl Settings {
    /// Settings of the build whose settings file is `settings_file`.
    ///
    /// The root directory is the file's parent directory.
    pub fn new(settings_file: impl Into<PathBuf>) -> Self {
        let settings_file = settings_file.into();
        let root_dir = settings_file.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            root_dir,
            settings_file,
            source_control: SourceControl::new(),
            scm_builds: Vec::new(),
            dependencies: Vec::new(),
            included_builds: Vec::new(),
        }
    }

    /// Root directory of the build.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// The settings file the build was loaded from.
    #[must_use]
    pub fn settings_file(&self) -> &Path {
        &self.settings_file
    }

    /// Source control configuration.
    #[must_use]
    pub const fn source_control(&self) -> &SourceControl {
        &self.source_control
    }

    /// Mutable source control configuration.
    pub const fn source_control_mut(&mut self) -> &mut SourceControl {
        &mut self.source_control
    }

    /// Declare an ScmBuild.
    ///
    /// # Errors
    ///
    /// [`VcsError::ConflictingScmBuild`] when another ScmBuild has the same
    /// name, or a repository of that name checks out a different source.
    /// Both would land in the same checkout directory.
    pub fn add_scm_build(&mut self, build: ScmBuild) -> Result<(), VcsError> {
        let conflict = if self.scm_builds.iter().any(|existing| existing.name() == build.name()) {
            Some("another scm build".to_string())
        } else {
            self.source_control
                .repositories()
                .get(build.name())
                .filter(|repository| repository.kind() != build.source())
                .map(|repository| format!("repository {}", repository.kind()))
        };

        if let Some(conflict) = conflict {
            return Err(VcsError::ConflictingScmBuild {
                name: build.name().to_string(),
                conflict,
            });
        }

        self.scm_builds.push(build);
        Ok(())
    }

    /// ScmBuilds not yet consumed.
    #[must_use]
    pub fn scm_builds(&self) -> &[ScmBuild] {
        &self.scm_builds
    }

    /// Remove and return the declared ScmBuilds, in declaration order.
    pub fn take_scm_builds(&mut self) -> Vec<ScmBuild> {
        std::mem::take(&mut self.scm_builds)
    }

    /// Record a dependency the build could not resolve on its own.
    pub fn add_dependency(&mut self, coordinate: DependencyCoordinate) {
        self.dependencies.push(coordinate);
    }

    /// Declared dependencies.
    #[must_use]
    pub fn dependencies(&self) -> &[DependencyCoordinate] {
        &self.dependencies
    }

    /// Fold the build rooted at `root_dir` into this build.
    ///
    /// `configure` receives the build's empty substitution rules.
    pub fn include_build<F>(&mut self, root_dir: impl Into<PathBuf>, origin: BuildOrigin, configure: F) -> &IncludedBuild
    where
        F: FnOnce(&mut DependencySubstitutions),
    {
        let root_dir = root_dir.into();
        let name = root_dir
            .file_name()
            .map_or_else(|| root_dir.display().to_string(), |name| name.to_string_lossy().into_owned());

        let mut substitutions = DependencySubstitutions::default();
        configure(&mut substitutions);

        tracing::info!(
            target: "settings",
            "Including build '{name}' from {} ({origin}, {} substitution(s))",
            root_dir.display(),
            substitutions.len()
        );

        self.included_builds.push(IncludedBuild {
            name,
            root_dir,
            substitutions,
            origin,
        });
        let index = self.included_builds.len() - 1;
        &self.included_builds[index]
    }

    /// Builds included so far, in inclusion order.
    #[must_use]
    pub fn included_builds(&self) -> &[IncludedBuild] {
        &self.included_builds
    }
}
