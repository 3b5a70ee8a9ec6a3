//! Explicitly declared source builds

use std::fmt;

use super::DependencySubstitutions;
use crate::repository::VcsKind;

/// Callback contributing substitution rules to an included build.
pub type SubstitutionAction = Box<dyn Fn(&mut DependencySubstitutions) + Send + Sync>;

/// A build checked out from source control and included as-is.
///
/// ```rust
/// use vcsdeps::repository::VcsKind;
/// use vcsdeps::settings::ScmBuild;
///
/// let mut build = ScmBuild::new("tooling", VcsKind::git("https://example.com/tooling.git"));
/// build.substitute("org.example:tooling", ":tooling");
/// assert_eq!(build.action_count(), 1);
/// ```
pub struct ScmBuild {
    name: String,
    source: VcsKind,
    actions: Vec<SubstitutionAction>,
}

impl ScmBuild {
    /// Build `name` checked out from `source`.
    pub fn new(name: impl Into<String>, source: VcsKind) -> Self {
        Self {
            name: name.into(),
            source,
            actions: Vec::new(),
        }
    }

    /// Name, also used as the checkout directory name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the build is checked out from.
    #[must_use]
    pub const fn source(&self) -> &VcsKind {
        &self.source
    }

    /// Add a substitution action. Actions run in the order they were added.
    pub fn dependency_substitution<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(&mut DependencySubstitutions) + Send + Sync + 'static,
    {
        self.actions.push(Box::new(action));
        self
    }

    /// Shorthand for an action substituting `module` with `project`.
    pub fn substitute(&mut self, module: impl Into<String>, project: impl Into<String>) -> &mut Self {
        let module = module.into();
        let project = project.into();
        self.dependency_substitution(move |substitutions| {
            substitutions.substitute(module.clone(), project.clone());
        })
    }

    /// Number of substitution actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Run every action against `substitutions`, in order.
    pub fn apply(&self, substitutions: &mut DependencySubstitutions) {
        for action in &self.actions {
            action(substitutions);
        }
    }
}

impl fmt::Debug for ScmBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScmBuild")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("actions", &self.actions.len())
            .finish()
    }
}
