//! The settings loader chain
//!
//! Loading settings is a chain of decorators around [`DefaultSettingsLoader`].
//! Each decorator lets its delegate load first, reads the populated model,
//! checks out what it finds through the shared [`CheckoutEngine`], and includes
//! every checkout as a build before returning the same settings object.
//!
//! ```text
//! SourceControlSettingsLoader      3. include repositories resolved for
//!   └── ScmBuildSettingsLoader     2. include declared ScmBuilds
//!         └── DefaultSettingsLoader   1. find and parse settings.toml
//! ```
//!
//! Builds are processed in declaration order and nothing is retried: the first
//! failing checkout aborts the whole load.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vcsdeps::cache::CacheRoot;
//! use vcsdeps::checkout::CheckoutEngine;
//! use vcsdeps::settings::loader::{default_chain, SettingsLoader, SettingsRequest};
//! use vcsdeps::vcs::{SystemCommandRunner, VcsTool};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let engine = Arc::new(CheckoutEngine::new(
//!     CacheRoot::new("/home/me/.vcsdeps"),
//!     SystemCommandRunner::new(),
//!     VcsTool::git("git"),
//! ));
//! let settings = default_chain(engine)
//!     .find_and_load_settings(&SettingsRequest::discover(std::env::current_dir()?))
//!     .await?;
//! for build in settings.included_builds() {
//!     println!("{} -> {}", build.name, build.root_dir.display());
//! }
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use super::file::SettingsFile;
use super::{BuildOrigin, SETTINGS_FILE, Settings};
use crate::checkout::CheckoutEngine;
use crate::core::VcsError;
use crate::mapping::DependencyCoordinate;
use crate::vcs::VcsCommandRunner;

/// Where to find the settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsRequest {
    /// Directory the search starts from
    pub start_dir: PathBuf,
    /// Explicit settings file, bypassing the search
    pub settings_file: Option<PathBuf>,
}

impl SettingsRequest {
    /// Search upwards from `start_dir`.
    pub fn discover(start_dir: impl Into<PathBuf>) -> Self {
        Self {
            start_dir: start_dir.into(),
            settings_file: None,
        }
    }

    /// Use `settings_file` directly.
    pub fn explicit(settings_file: impl Into<PathBuf>) -> Self {
        let settings_file = settings_file.into();
        Self {
            start_dir: settings_file.parent().map(PathBuf::from).unwrap_or_default(),
            settings_file: Some(settings_file),
        }
    }
}

/// Produces a populated [`Settings`].
pub trait SettingsLoader: Send + Sync {
    /// Find the settings file for `request`, evaluate it and run any follow-up steps.
    fn find_and_load_settings(&self, request: &SettingsRequest) -> impl Future<Output = Result<Settings>> + Send;
}

/// Base loader: locates and evaluates `settings.toml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSettingsLoader;

impl DefaultSettingsLoader {
    /// New base loader.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn locate(request: &SettingsRequest) -> Result<PathBuf, VcsError> {
        if let Some(file) = &request.settings_file {
            if file.is_file() {
                return Ok(file.clone());
            }
            return Err(VcsError::SettingsNotFound {
                start: file.clone(),
            });
        }

        crate::utils::find_upwards(&request.start_dir, SETTINGS_FILE).ok_or_else(|| {
            VcsError::SettingsNotFound {
                start: request.start_dir.clone(),
            }
        })
    }
}

impl SettingsLoader for DefaultSettingsLoader {
    async fn find_and_load_settings(&self, request: &SettingsRequest) -> Result<Settings> {
        let file = Self::locate(request)?;
        let file = std::path::absolute(&file)
            .with_context(|| format!("Failed to resolve settings file {}", file.display()))?;
        tracing::debug!(target: "settings", "Loading settings from {}", file.display());

        SettingsFile::read(&file).await?.into_settings(&file)
    }
}

/// Includes every declared [`ScmBuild`](super::ScmBuild) after the delegate loaded the settings.
#[derive(Debug)]
pub struct ScmBuildSettingsLoader<L, R> {
    delegate: L,
    engine: Arc<CheckoutEngine<R>>,
}

impl<L, R> ScmBuildSettingsLoader<L, R> {
    /// Decorate `delegate`.
    pub const fn new(delegate: L, engine: Arc<CheckoutEngine<R>>) -> Self {
        Self { delegate, engine }
    }
}

impl<L: SettingsLoader, R: VcsCommandRunner> SettingsLoader for ScmBuildSettingsLoader<L, R> {
    async fn find_and_load_settings(&self, request: &SettingsRequest) -> Result<Settings> {
        let mut settings = self.delegate.find_and_load_settings(request).await?;

        for build in settings.take_scm_builds() {
            let checkout = self
                .engine
                .checkout(build.name(), build.source())
                .await
                .with_context(|| format!("Failed to prepare scm build '{}'", build.name()))?;

            settings.include_build(
                checkout.working_dir,
                BuildOrigin::ScmBuild(build.name().to_string()),
                |substitutions| build.apply(substitutions),
            );
        }

        Ok(settings)
    }
}

/// Reports the dependencies the build could not satisfy.
///
/// This is the seam to the dependency resolver of the build: whatever it
/// reports here is looked up in the source control mappings.
pub trait UnresolvedDependencies: Send + Sync {
    /// Coordinates without a provider, given the settings loaded so far.
    fn unresolved_dependencies(&self, settings: &Settings) -> Vec<DependencyCoordinate>;
}

/// Declared dependencies not provided by an already included build.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredDependencies;

impl UnresolvedDependencies for DeclaredDependencies {
    fn unresolved_dependencies(&self, settings: &Settings) -> Vec<DependencyCoordinate> {
        settings
            .dependencies()
            .iter()
            .filter(|coordinate| {
                !settings
                    .included_builds()
                    .iter()
                    .any(|build| build.substitutions.provides(coordinate))
            })
            .cloned()
            .collect()
    }
}

/// Includes the repositories resolved for unsatisfied dependencies.
#[derive(Debug)]
pub struct SourceControlSettingsLoader<L, R, U> {
    delegate: L,
    engine: Arc<CheckoutEngine<R>>,
    unresolved: U,
}

impl<L, R, U> SourceControlSettingsLoader<L, R, U> {
    /// Decorate `delegate`, asking `unresolved` what is missing.
    pub const fn new(delegate: L, engine: Arc<CheckoutEngine<R>>, unresolved: U) -> Self {
        Self {
            delegate,
            engine,
            unresolved,
        }
    }
}

impl<L, R, U> SettingsLoader for SourceControlSettingsLoader<L, R, U>
where
    L: SettingsLoader,
    R: VcsCommandRunner,
    U: UnresolvedDependencies,
{
    async fn find_and_load_settings(&self, request: &SettingsRequest) -> Result<Settings> {
        let mut settings = self.delegate.find_and_load_settings(request).await?;

        let unresolved = self.unresolved.unresolved_dependencies(&settings);
        if unresolved.is_empty() {
            tracing::debug!(target: "settings", "No unresolved dependencies");
            return Ok(settings);
        }

        let resolved = settings.source_control().resolved_repositories_for(&unresolved);
        if resolved.is_empty() {
            tracing::debug!(target: "settings", "No repository provides {} unresolved dependencies", unresolved.len());
        }

        for entry in resolved {
            let name = entry.repository.name();
            let checkout = self
                .engine
                .checkout(name, entry.repository.kind())
                .await
                .with_context(|| format!("Failed to prepare repository '{name}'"))?;

            settings.include_build(checkout.working_dir, BuildOrigin::Repository(name.to_string()), |_| {});
        }

        Ok(settings)
    }
}

/// The standard chain: source control over ScmBuilds over the base loader.
pub type DefaultChain<R> =
    SourceControlSettingsLoader<ScmBuildSettingsLoader<DefaultSettingsLoader, R>, R, DeclaredDependencies>;

/// Build the standard chain around `engine`.
pub fn default_chain<R>(engine: Arc<CheckoutEngine<R>>) -> DefaultChain<R> {
    SourceControlSettingsLoader::new(
        ScmBuildSettingsLoader::new(DefaultSettingsLoader::new(), engine.clone()),
        engine,
        DeclaredDependencies,
    )
}
