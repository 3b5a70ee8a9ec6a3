//! Error handling for vcsdeps
//!
//! Two layers, following the same split everywhere in the crate:
//! 1. [`VcsError`], a strongly-typed enum for every failure mode of the
//!    source-control subsystem, so callers and tests can match on the exact case.
//! 2. [`ErrorContext`], a wrapper adding a user-facing suggestion and details for
//!    the CLI. [`user_friendly_error`] builds one from any [`anyhow::Error`].
//!
//! # Error Categories
//!
//! - **Configuration**: [`VcsError::DuplicateRepository`],
//!   [`VcsError::UnknownRepository`], [`VcsError::DuplicateMapping`],
//!   [`VcsError::InvalidCoordinate`], [`VcsError::InvalidRepositoryName`],
//!   [`VcsError::ConflictingScmBuild`].
//!   Raised synchronously while the settings are evaluated.
//! - **Cache state**: [`VcsError::AlreadyOpen`]. A programming error, never retried.
//! - **Checkout**: [`VcsError::CheckoutFailed`], [`VcsError::CreateDirFailed`],
//!   [`VcsError::SourceDirectoryMissing`], [`VcsError::VcsNotFound`]. Fatal to the
//!   current invocation and never retried automatically.
//! - **Settings**: [`VcsError::SettingsNotFound`], [`VcsError::SettingsParseError`],
//!   [`VcsError::ConfigError`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use vcsdeps::core::{VcsError, user_friendly_error};
//!
//! let error = VcsError::UnknownRepository {
//!     name: "gradel".to_string(),
//!     suggestion: Some("gradle".to_string()),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::file_error::FileOperationError;

/// The main error type for source-control operations
#[derive(Error, Debug)]
pub enum VcsError {
    /// A repository with the same name is already registered.
    #[error("Cannot add repository '{name}': a repository with that name is already registered")]
    DuplicateRepository {
        /// The repository name that was registered twice
        name: String,
    },

    /// A mapping referenced a repository name that was never registered.
    #[error("Repository '{name}' is not registered")]
    UnknownRepository {
        /// The name that could not be found
        name: String,
        /// Closest registered name, if one is similar enough
        suggestion: Option<String>,
    },

    /// The same (repository, mapping) pair was added twice.
    #[error("Cannot add the same mapping twice: {mapping} is already mapped to repository '{repository}'")]
    DuplicateMapping {
        /// The repository the mapping targets
        repository: String,
        /// Display form of the duplicated mapping
        mapping: String,
    },

    /// A dependency coordinate string could not be parsed.
    #[error("Invalid dependency coordinate '{coordinate}': {reason}")]
    InvalidCoordinate {
        /// The raw coordinate text
        coordinate: String,
        /// Why the coordinate was rejected
        reason: String,
    },

    /// A repository name is not usable as a cache directory name.
    #[error("Invalid repository name '{name}': only letters, digits, '.', '_' and '-' are allowed")]
    InvalidRepositoryName {
        /// The rejected name
        name: String,
    },

    /// An ScmBuild name is already used by another checkout with a different source.
    #[error("Cannot add scm build '{name}': the name is already used by {conflict}")]
    ConflictingScmBuild {
        /// The ScmBuild name
        name: String,
        /// The other declaration using the name
        conflict: String,
    },

    /// `open()` was called on a cache guard that already holds its lock.
    #[error("File lock {} is already open", .lock_target.display())]
    AlreadyOpen {
        /// The lock file the guard manages
        lock_target: PathBuf,
    },

    /// The external VCS command exited abnormally.
    #[error("Checkout of {} failed: `{command}` exited with {}", .destination.display(), exit_code.map_or_else(|| "no exit code (terminated by signal)".to_string(), |code| format!("exit code {code}")))]
    CheckoutFailed {
        /// The full command line that was executed
        command: String,
        /// The exit code, `None` when the process was killed by a signal
        exit_code: Option<i32>,
        /// The checkout destination
        destination: PathBuf,
        /// Captured standard error of the command
        stderr: String,
    },

    /// The directory structure for a checkout could not be created.
    #[error("Couldn't create checkout directory {}", .path.display())]
    CreateDirFailed {
        /// The directory that could not be created
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The source directory of a directory repository does not exist.
    #[error("Source directory {} of repository '{repository}' does not exist", .path.display())]
    SourceDirectoryMissing {
        /// The repository whose directory is missing
        repository: String,
        /// The directory that was expected
        path: PathBuf,
    },

    /// The VCS executable could not be found.
    #[error("VCS executable '{executable}' is not installed or not found in PATH")]
    VcsNotFound {
        /// The executable that was looked up
        executable: String,
    },

    /// No settings file was found.
    #[error("Settings file settings.toml not found in {} or any parent directory", .start.display())]
    SettingsNotFound {
        /// The directory the search started from
        start: PathBuf,
    },

    /// The settings file could not be parsed.
    #[error("Invalid settings file syntax in {}", .file.display())]
    SettingsParseError {
        /// The settings file
        file: PathBuf,
        /// The parser message
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// File system operation failed with full context
    #[error(transparent)]
    FileOperation(#[from] FileOperationError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl VcsError {
    /// Whether this error is a configuration error raised while evaluating settings.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRepository { .. }
                | Self::UnknownRepository { .. }
                | Self::DuplicateMapping { .. }
                | Self::InvalidCoordinate { .. }
                | Self::InvalidRepositoryName { .. }
                | Self::ConflictingScmBuild { .. }
        )
    }
}

/// Error wrapper carrying a user-facing suggestion and details
///
/// The CLI converts every failure into an `ErrorContext` before printing, so that
/// the user sees what failed, why it usually fails, and what to try next.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: VcsError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details
    #[must_use]
    pub const fn new(error: VcsError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`VcsError`] (anywhere in the error chain, so context added with
/// `anyhow::Context` does not hide it), [`FileOperationError`], IO errors and
/// TOML parse errors. Anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain_message = format_chain(&error);

    for cause in error.chain() {
        if let Some(vcs_error) = cause.downcast_ref::<VcsError>() {
            return create_error_context(vcs_error, &chain_message);
        }
        if let Some(file_error) = cause.downcast_ref::<FileOperationError>() {
            return ErrorContext::new(VcsError::Other {
                message: file_error.user_message(),
            })
            .with_suggestion("Check that the path exists and that you have permission to modify it");
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return ErrorContext::new(VcsError::Other {
                message: chain_message,
            })
            .with_suggestion("Check file ownership and permissions of the cache directory")
            .with_details("vcsdeps needs write access to its user home to check out sources");
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(VcsError::Other {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax. Verify quotes, brackets, and table names");
    }

    ErrorContext::new(VcsError::Other {
        message: chain_message,
    })
}

fn format_chain(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    message
}

fn create_error_context(error: &VcsError, chain_message: &str) -> ErrorContext {
    let context = ErrorContext::new(VcsError::Other {
        message: chain_message.to_string(),
    });

    match error {
        VcsError::DuplicateRepository { name } => context
            .with_suggestion(format!("Remove or rename the second [[repositories]] entry named '{name}'"))
            .with_details("Repository names identify cache directories and must be unique"),

        VcsError::UnknownRepository { name, suggestion } => {
            let hint = match suggestion {
                Some(candidate) => format!("Did you mean '{candidate}'?"),
                None => format!("Declare a [[repositories]] entry named '{name}' before mapping to it"),
            };
            context
                .with_suggestion(hint)
                .with_details("Every vcs-mappings entry must reference a declared repository")
        }

        VcsError::DuplicateMapping { .. } => context
            .with_suggestion("Remove the duplicated [[vcs-mappings]] entry")
            .with_details("A (repository, mapping) pair may be declared at most once"),

        VcsError::InvalidCoordinate { .. } => context
            .with_suggestion("Use the form 'group:module' or 'group:module:version'"),

        VcsError::InvalidRepositoryName { .. } => context
            .with_suggestion("Rename the repository using only letters, digits, '.', '_' and '-'"),

        VcsError::ConflictingScmBuild { .. } => context
            .with_suggestion("Give the [[scm-builds]] entry a name of its own")
            .with_details("Checkouts are stored by name, so one name cannot point at two sources"),

        VcsError::AlreadyOpen { .. } => context
            .with_details("This is an internal error: a cache guard was opened twice"),

        VcsError::CheckoutFailed { stderr, .. } => {
            let context = context.with_suggestion(
                "Check the repository URL, your network connection and credentials, then run the command shown above manually",
            );
            if stderr.trim().is_empty() {
                context
            } else {
                context.with_details(stderr.trim().to_string())
            }
        }

        VcsError::CreateDirFailed { .. } => context
            .with_suggestion("Check permissions and free disk space in the vcsdeps user home"),

        VcsError::SourceDirectoryMissing { .. } => context
            .with_suggestion("Fix the 'dir' of the directory repository; relative paths resolve against the build root"),

        VcsError::VcsNotFound { executable } => context
            .with_suggestion(format!(
                "Install {executable} or point [git] executable in the global config at it"
            ))
            .with_details("Repositories of kind 'git' are checked out by running the git executable"),

        VcsError::SettingsNotFound { .. } => context
            .with_suggestion("Create a settings.toml in the build root or pass --settings <path>"),

        VcsError::SettingsParseError { reason, .. } => context
            .with_details(reason.clone())
            .with_suggestion("Check the TOML syntax and the field names of the settings file"),

        _ => context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_duplicate_mapping_message() {
        let error = VcsError::DuplicateMapping {
            repository: "gradle".to_string(),
            mapping: "maven(org.gradle:tooling-api)".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Cannot add the same mapping twice: maven(org.gradle:tooling-api) is already mapped to repository 'gradle'"
        );
        assert!(error.is_configuration_error());
    }

    #[test]
    fn test_checkout_failed_message_includes_command_and_code() {
        let error = VcsError::CheckoutFailed {
            command: "git clone https://example.com/repo /cache/gits/repo".to_string(),
            exit_code: Some(128),
            destination: PathBuf::from("/cache/gits/repo"),
            stderr: String::new(),
        };
        let message = error.to_string();
        assert!(message.contains("git clone https://example.com/repo /cache/gits/repo"));
        assert!(message.contains("exit code 128"));
        assert!(message.contains("/cache/gits/repo"));
        assert!(!error.is_configuration_error());
    }

    #[test]
    fn test_checkout_failed_without_exit_code() {
        let error = VcsError::CheckoutFailed {
            command: "git pull".to_string(),
            exit_code: None,
            destination: PathBuf::from("/cache/gits/repo"),
            stderr: String::new(),
        };
        assert!(error.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_user_friendly_error_finds_typed_error_behind_context() {
        let error = anyhow::Error::from(VcsError::UnknownRepository {
            name: "gradel".to_string(),
            suggestion: Some("gradle".to_string()),
        })
        .context("Failed to evaluate settings");

        let context = user_friendly_error(error);
        assert_eq!(context.suggestion.as_deref(), Some("Did you mean 'gradle'?"));
        assert!(context.to_string().contains("Repository 'gradel' is not registered"));
    }

    #[test]
    fn test_user_friendly_error_generic_includes_chain() {
        let result: anyhow::Result<()> = Err(anyhow::anyhow!("root cause"));
        let error = result.context("outer").unwrap_err();

        let context = user_friendly_error(error);
        let rendered = context.to_string();
        assert!(rendered.contains("outer"));
        assert!(rendered.contains("root cause"));
        assert!(context.suggestion.is_none());
    }

    #[test]
    fn test_error_context_display() {
        let context = ErrorContext::new(VcsError::ConfigError {
            message: "bad".to_string(),
        })
        .with_details("some details")
        .with_suggestion("do this");

        let rendered = context.to_string();
        assert!(rendered.contains("Configuration error: bad"));
        assert!(rendered.contains("Details: some details"));
        assert!(rendered.contains("Suggestion: do this"));
    }
}
