//! Source control facade: repositories plus mappings
//!
//! [`SourceControl`] is what the settings file populates. Configuration goes
//! through [`SourceControl::configure_repositories`] and
//! [`SourceControl::vcs_mappings`]; the loader chain later asks
//! [`SourceControl::resolved_repositories_for`] which repositories provide the
//! dependencies the build could not satisfy.
//!
//! Every query returns an owned snapshot. Changing the registry afterwards never
//! changes a result that was already handed out.
//!
//! ```rust
//! use vcsdeps::mapping::DependencyCoordinate;
//! use vcsdeps::source_control::SourceControl;
//!
//! let mut source_control = SourceControl::new();
//! source_control.configure_repositories(|repositories| {
//!     repositories.git("gradle", "https://github.com/gradle/gradle")?;
//!     Ok(())
//! })?;
//! source_control.vcs_mappings(|mappings| {
//!     let tooling = mappings.maven("org.gradle", "tooling-api");
//!     mappings.add("gradle", tooling)
//! })?;
//!
//! let wanted: DependencyCoordinate = "org.gradle:tooling-api:1.0".parse()?;
//! let resolved = source_control.resolved_repositories_for([&wanted]);
//! assert_eq!(resolved.names().collect::<Vec<_>>(), ["gradle"]);
//! # Ok::<(), vcsdeps::core::VcsError>(())
//! ```

use crate::core::VcsError;
use crate::mapping::{self, DependencyCoordinate, DependencyMapping, MappingTable};
use crate::repository::{Repository, RepositoryRegistry};

/// Repositories and the dependencies they provide.
#[derive(Debug, Clone, Default)]
pub struct SourceControl {
    repositories: RepositoryRegistry,
    mappings: MappingTable,
}

impl SourceControl {
    /// Empty source control configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a configuration closure against the repository registry.
    pub fn configure_repositories<F>(&mut self, configure: F) -> Result<(), VcsError>
    where
        F: FnOnce(&mut RepositoryRegistry) -> Result<(), VcsError>,
    {
        configure(&mut self.repositories)
    }

    /// The repository registry.
    #[must_use]
    pub const fn repositories(&self) -> &RepositoryRegistry {
        &self.repositories
    }

    /// Mutable access to the repository registry.
    pub const fn repositories_mut(&mut self) -> &mut RepositoryRegistry {
        &mut self.repositories
    }

    /// Run a configuration closure against the mapping handler.
    pub fn vcs_mappings<F>(&mut self, configure: F) -> Result<(), VcsError>
    where
        F: FnOnce(&mut VcsMappingHandler<'_>) -> Result<(), VcsError>,
    {
        let mut handler = VcsMappingHandler {
            repositories: &self.repositories,
            mappings: &mut self.mappings,
        };
        configure(&mut handler)
    }

    /// Snapshot of every repository that has at least one mapping, with its mappings.
    #[must_use]
    pub fn repository_to_mappings(&self) -> ResolvedRepositories {
        self.collect(|_| true)
    }

    /// Snapshot of the repositories whose mappings match any of `coordinates`.
    ///
    /// Each entry carries all mappings of its repository. Order follows
    /// repository declaration order.
    pub fn resolved_repositories_for<'a, I>(&self, coordinates: I) -> ResolvedRepositories
    where
        I: IntoIterator<Item = &'a DependencyCoordinate>,
    {
        let coordinates: Vec<&DependencyCoordinate> = coordinates.into_iter().collect();
        self.collect(|mappings| {
            mappings
                .iter()
                .any(|mapping| coordinates.iter().any(|coordinate| mapping.matches(coordinate)))
        })
    }

    fn collect(&self, keep: impl Fn(&[DependencyMapping]) -> bool) -> ResolvedRepositories {
        let entries = self
            .repositories
            .iter()
            .filter_map(|repository| {
                let mappings = self.mappings.get(repository.name());
                (!mappings.is_empty() && keep(mappings)).then(|| ResolvedRepository {
                    repository: repository.clone(),
                    mappings: mappings.to_vec(),
                })
            })
            .collect();
        ResolvedRepositories { entries }
    }
}

/// Adds mappings; only repositories already registered can be targeted.
#[derive(Debug)]
pub struct VcsMappingHandler<'a> {
    repositories: &'a RepositoryRegistry,
    mappings: &'a mut MappingTable,
}

impl VcsMappingHandler<'_> {
    /// Map `mapping` to the repository named `repository`.
    ///
    /// # Errors
    ///
    /// [`VcsError::UnknownRepository`] when no repository has that name, and
    /// [`VcsError::DuplicateMapping`] when the pair already exists. Nothing is
    /// recorded in either case.
    pub fn add(&mut self, repository: &str, mapping: DependencyMapping) -> Result<(), VcsError> {
        let repository = self.repositories.get_by_name(repository)?;

        if !self.mappings.insert(repository.name(), mapping.clone()) {
            return Err(VcsError::DuplicateMapping {
                repository: repository.name().to_string(),
                mapping: mapping.to_string(),
            });
        }

        tracing::debug!(target: "vcs", "Mapped {mapping} to repository '{}'", repository.name());
        Ok(())
    }

    /// Maven mapping constructor. Adds nothing.
    #[must_use]
    pub fn maven(&self, group: &str, module: &str) -> DependencyMapping {
        mapping::maven(group, module)
    }
}

/// One repository and its mappings, as captured by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRepository {
    /// The repository
    pub repository: Repository,
    /// Its mappings, in insertion order
    pub mappings: Vec<DependencyMapping>,
}

/// Immutable query result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRepositories {
    entries: Vec<ResolvedRepository>,
}

impl ResolvedRepositories {
    /// Entries in repository declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedRepository> {
        self.entries.iter()
    }

    /// Repository names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.repository.name())
    }

    /// Mappings of one repository, if it is part of the result.
    #[must_use]
    pub fn mappings_of(&self, repository: &str) -> Option<&[DependencyMapping]> {
        self.entries
            .iter()
            .find(|entry| entry.repository.name() == repository)
            .map(|entry| entry.mappings.as_slice())
    }

    /// Number of repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for ResolvedRepositories {
    type Item = ResolvedRepository;
    type IntoIter = std::vec::IntoIter<ResolvedRepository>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
