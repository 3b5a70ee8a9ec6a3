//! Declared source repositories
//!
//! A [`Repository`] is a named VCS location. The set of repositories for a
//! build lives in a [`RepositoryRegistry`], which rejects duplicate names and
//! keeps declaration order so checkouts happen in the order the user wrote them.
//!
//! # Examples
//!
//! ```rust
//! use vcsdeps::repository::{RepositoryRegistry, VcsKind};
//!
//! let mut registry = RepositoryRegistry::new();
//! registry.git("gradle", "https://github.com/gradle/gradle")?;
//! registry.directory("shared", "../shared")?;
//!
//! assert!(registry.register("gradle", VcsKind::directory("/tmp")).is_err());
//! assert_eq!(registry.names().collect::<Vec<_>>(), ["gradle", "shared"]);
//! # Ok::<(), vcsdeps::core::VcsError>(())
//! ```

use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::core::VcsError;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+$").unwrap_or_else(|e| panic!("invalid name pattern: {e}"))
});

/// Connection information of a repository, one variant per VCS.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VcsKind {
    /// A git repository checked out with the external `git` command.
    Git {
        /// Clone URL
        url: String,
    },
    /// A local directory copied into the cache.
    Directory {
        /// Source directory
        dir: PathBuf,
    },
}

impl VcsKind {
    /// Git repository at `url`.
    pub fn git(url: impl Into<String>) -> Self {
        Self::Git { url: url.into() }
    }

    /// Local directory repository.
    pub fn directory(dir: impl Into<PathBuf>) -> Self {
        Self::Directory { dir: dir.into() }
    }

    /// Short name of the VCS, as written in settings files.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Git { .. } => "git",
            Self::Directory { .. } => "directory",
        }
    }

    /// Human readable location: the URL or the directory.
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::Git { url } => url.clone(),
            Self::Directory { dir } => dir.display().to_string(),
        }
    }

    /// Resolve a relative directory against `base`. Git locations are unchanged.
    #[must_use]
    pub fn resolved_against(self, base: &Path) -> Self {
        match self {
            Self::Directory { dir } if dir.is_relative() => Self::Directory {
                dir: base.join(dir),
            },
            other => other,
        }
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind_name(), self.location())
    }
}

/// A named repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    name: String,
    kind: VcsKind,
}

impl Repository {
    /// Create a repository after validating its name.
    pub fn new(name: impl Into<String>, kind: VcsKind) -> Result<Self, VcsError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self { name, kind })
    }

    /// The unique name, also used as the checkout directory name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connection information.
    #[must_use]
    pub const fn kind(&self) -> &VcsKind {
        &self.kind
    }
}

/// Checks that `name` is usable as a single directory name.
pub fn validate_name(name: &str) -> Result<(), VcsError> {
    if NAME_PATTERN.is_match(name) && name != "." && name != ".." {
        Ok(())
    } else {
        Err(VcsError::InvalidRepositoryName {
            name: name.to_string(),
        })
    }
}

/// Insertion-ordered collection of repositories with unique names.
#[derive(Debug, Clone, Default)]
pub struct RepositoryRegistry {
    repositories: Vec<Repository>,
}

impl RepositoryRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a repository.
    ///
    /// # Errors
    ///
    /// [`VcsError::InvalidRepositoryName`] for unusable names and
    /// [`VcsError::DuplicateRepository`] when the name is taken. The registry is
    /// unchanged on error.
    pub fn register(&mut self, name: impl Into<String>, kind: VcsKind) -> Result<&Repository, VcsError> {
        let repository = Repository::new(name, kind)?;
        if self.contains(repository.name()) {
            return Err(VcsError::DuplicateRepository {
                name: repository.name,
            });
        }

        tracing::debug!(target: "vcs", "Registered repository '{}' -> {}", repository.name(), repository.kind());
        self.repositories.push(repository);
        let index = self.repositories.len() - 1;
        Ok(&self.repositories[index])
    }

    /// Register a git repository.
    pub fn git(&mut self, name: impl Into<String>, url: impl Into<String>) -> Result<&Repository, VcsError> {
        self.register(name, VcsKind::git(url))
    }

    /// Register a directory repository.
    pub fn directory(&mut self, name: impl Into<String>, dir: impl Into<PathBuf>) -> Result<&Repository, VcsError> {
        self.register(name, VcsKind::directory(dir))
    }

    /// Look up a repository by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Repository> {
        self.repositories.iter().find(|repository| repository.name == name)
    }

    /// Look up a repository, failing with a "did you mean" suggestion.
    pub fn get_by_name(&self, name: &str) -> Result<&Repository, VcsError> {
        self.get(name).ok_or_else(|| VcsError::UnknownRepository {
            name: name.to_string(),
            suggestion: self.closest_name(name),
        })
    }

    /// Whether a repository with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Repositories in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.iter()
    }

    /// Names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.repositories.iter().map(Repository::name)
    }

    /// Number of repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    /// Whether no repository is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    fn closest_name(&self, name: &str) -> Option<String> {
        self.names()
            .map(|candidate| (strsim::jaro_winkler(name, candidate), candidate))
            .filter(|(score, _)| *score >= 0.8)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, candidate)| candidate.to_string())
    }
}

impl<'a> IntoIterator for &'a RepositoryRegistry {
    type Item = &'a Repository;
    type IntoIter = std::slice::Iter<'a, Repository>;

    fn into_iter(self) -> Self::IntoIter {
        self.repositories.iter()
    }
}
