//! Dependency mappings and the repository → mappings table
//!
//! A [`DependencyMapping`] says which external dependencies a repository can
//! provide. A [`DependencyCoordinate`] is one dependency the build could not
//! satisfy; resolution asks which mappings [match](DependencyMapping::matches) it.

use std::fmt;
use std::str::FromStr;

use crate::core::VcsError;

/// A dependency the build asked for, `group:module[:version]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyCoordinate {
    /// Group, e.g. `org.gradle`
    pub group: String,
    /// Module, e.g. `tooling-api`
    pub module: String,
    /// Requested version, if any
    pub version: Option<String>,
}

impl DependencyCoordinate {
    /// Coordinate without a version.
    pub fn new(group: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
            version: None,
        }
    }

    /// Attach a version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// `group:module`, the version-less identity of the module.
    #[must_use]
    pub fn module_id(&self) -> String {
        format!("{}:{}", self.group, self.module)
    }
}

impl FromStr for DependencyCoordinate {
    type Err = VcsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| VcsError::InvalidCoordinate {
            coordinate: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.trim().split(':').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(invalid("expected 'group:module' or 'group:module:version'"));
        }
        if parts.iter().any(|part| part.trim().is_empty()) {
            return Err(invalid("group, module and version must not be empty"));
        }

        let coordinate = Self::new(parts[0].trim(), parts[1].trim());
        Ok(match parts.get(2) {
            Some(version) => coordinate.with_version(version.trim()),
            None => coordinate,
        })
    }
}

impl fmt::Display for DependencyCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}:{}", self.group, self.module, version),
            None => write!(f, "{}:{}", self.group, self.module),
        }
    }
}

/// A description of dependencies a repository provides.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyMapping {
    /// Maven module `group:module`, any version.
    Maven {
        /// Group
        group: String,
        /// Module
        module: String,
    },
    /// Descriptor interpreted by equality with a coordinate's `group:module`.
    Opaque(String),
}

/// Maven mapping constructor.
pub fn maven(group: impl Into<String>, module: impl Into<String>) -> DependencyMapping {
    DependencyMapping::Maven {
        group: group.into(),
        module: module.into(),
    }
}

impl DependencyMapping {
    /// Parse a `group:module` string into a Maven mapping.
    pub fn parse_maven(notation: &str) -> Result<Self, VcsError> {
        let coordinate: DependencyCoordinate = notation.parse()?;
        if coordinate.version.is_some() {
            return Err(VcsError::InvalidCoordinate {
                coordinate: notation.to_string(),
                reason: "mappings match every version, drop the version".to_string(),
            });
        }
        Ok(maven(coordinate.group, coordinate.module))
    }

    /// Whether this mapping provides the coordinate.
    #[must_use]
    pub fn matches(&self, coordinate: &DependencyCoordinate) -> bool {
        match self {
            Self::Maven { group, module } => *group == coordinate.group && *module == coordinate.module,
            Self::Opaque(descriptor) => *descriptor == coordinate.module_id(),
        }
    }
}

impl fmt::Display for DependencyMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Maven { group, module } => write!(f, "maven({group}:{module})"),
            Self::Opaque(descriptor) => write!(f, "{descriptor}"),
        }
    }
}

/// Set-valued association from repository name to mappings.
///
/// Both the repository keys and the mappings of each repository keep
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: Vec<(String, Vec<DependencyMapping>)>,
}

impl MappingTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping for a repository.
    ///
    /// Returns `false`, leaving the table unchanged, when the pair is already present.
    pub fn insert(&mut self, repository: &str, mapping: DependencyMapping) -> bool {
        match self.entries.iter_mut().find(|(name, _)| name == repository) {
            Some((_, mappings)) => {
                if mappings.contains(&mapping) {
                    return false;
                }
                mappings.push(mapping);
            }
            None => self.entries.push((repository.to_string(), vec![mapping])),
        }
        true
    }

    /// Mappings of one repository, empty when it has none.
    #[must_use]
    pub fn get(&self, repository: &str) -> &[DependencyMapping] {
        self.entries
            .iter()
            .find(|(name, _)| name == repository)
            .map_or(&[][..], |(_, mappings)| mappings.as_slice())
    }

    /// Whether the exact pair is present.
    #[must_use]
    pub fn contains(&self, repository: &str, mapping: &DependencyMapping) -> bool {
        self.get(repository).contains(mapping)
    }

    /// Total number of (repository, mapping) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, mappings)| mappings.len()).sum()
    }

    /// Whether the table holds no pair.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Repositories with at least one mapping, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DependencyMapping])> {
        self.entries.iter().map(|(name, mappings)| (name.as_str(), mappings.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates() {
        let with_version: DependencyCoordinate = "org.gradle:tooling-api:1.0".parse().unwrap();
        assert_eq!(with_version, DependencyCoordinate::new("org.gradle", "tooling-api").with_version("1.0"));
        assert_eq!(with_version.to_string(), "org.gradle:tooling-api:1.0");
        assert_eq!(with_version.module_id(), "org.gradle:tooling-api");

        let bare: DependencyCoordinate = "org.gradle:tooling-api".parse().unwrap();
        assert!(bare.version.is_none());

        for bad in ["", "org.gradle", "a:b:c:d", "a::1", ":b"] {
            let err = bad.parse::<DependencyCoordinate>().unwrap_err();
            assert!(matches!(err, VcsError::InvalidCoordinate { .. }), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_maven_mapping_matches_any_version() {
        let mapping = maven("org.gradle", "tooling-api");
        assert!(mapping.matches(&"org.gradle:tooling-api:1.0".parse().unwrap()));
        assert!(mapping.matches(&"org.gradle:tooling-api:2.3".parse().unwrap()));
        assert!(!mapping.matches(&"org.gradle:other:1.0".parse().unwrap()));
        assert!(!mapping.matches(&"com.gradle:tooling-api:1.0".parse().unwrap()));

        let opaque = DependencyMapping::Opaque("org.gradle:tooling-api".to_string());
        assert!(opaque.matches(&"org.gradle:tooling-api:9".parse().unwrap()));
    }

    #[test]
    fn test_parse_maven_rejects_version() {
        assert_eq!(DependencyMapping::parse_maven("org.gradle:tooling-api").unwrap(), maven("org.gradle", "tooling-api"));
        assert!(DependencyMapping::parse_maven("org.gradle:tooling-api:1.0").is_err());
    }

    #[test]
    fn test_insert_rejects_duplicate_pair() {
        let mut table = MappingTable::new();
        assert!(table.insert("gradle", maven("org.gradle", "tooling-api")));
        assert!(!table.insert("gradle", maven("org.gradle", "tooling-api")));
        assert_eq!(table.len(), 1);

        // Same mapping on another repository is a different pair
        assert!(table.insert("other", maven("org.gradle", "tooling-api")));
        assert!(table.insert("gradle", maven("org.gradle", "core")));
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("gradle"), &[maven("org.gradle", "tooling-api"), maven("org.gradle", "core")]);
        assert!(table.get("missing").is_empty());
    }
}
