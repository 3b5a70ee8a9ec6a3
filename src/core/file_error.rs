//! Structured file system error handling for vcsdeps
//!
//! Captures the operation, path and caller at the failing call site so that
//! checkout and cache errors name the exact directory that could not be
//! touched, instead of a bare `No such file or directory`.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Types of file operations performed by the checkout and cache layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    /// Reading a file completely
    Read,
    /// Writing a file
    Write,
    /// Getting file metadata
    Metadata,
    /// Creating a directory
    CreateDir,
    /// Removing a file or directory tree
    Remove,
    /// Copying a file or directory tree
    Copy,
    /// Resolving a path to its absolute form
    Canonicalize,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Metadata => write!(f, "getting metadata of"),
            FileOperation::CreateDir => write!(f, "creating directory"),
            FileOperation::Remove => write!(f, "removing"),
            FileOperation::Copy => write!(f, "copying"),
            FileOperation::Canonicalize => write!(f, "resolving path"),
        }
    }
}

/// Detailed file operation context for better error messages
#[derive(Debug, Clone)]
pub struct FileOperationContext {
    /// The type of operation being performed
    pub operation: FileOperation,
    /// The path being accessed
    pub file_path: PathBuf,
    /// Why the path is being accessed
    pub purpose: String,
    /// The component that initiated the operation
    pub caller: String,
}

impl FileOperationContext {
    /// Create a new file operation context
    pub fn new(
        operation: FileOperation,
        file_path: impl Into<PathBuf>,
        purpose: impl Into<String>,
        caller: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            file_path: file_path.into(),
            purpose: purpose.into(),
            caller: caller.into(),
        }
    }
}

/// File operation error with full context
#[derive(Error, Debug)]
#[error("Failed {operation} '{}' while {purpose} ({caller})", .file_path.display())]
pub struct FileOperationError {
    /// The type of operation that failed
    pub operation: FileOperation,
    /// The path that was being accessed
    pub file_path: PathBuf,
    /// Why the path was being accessed
    pub purpose: String,
    /// What code initiated the operation
    pub caller: String,
    /// The underlying IO error
    #[source]
    pub source: std::io::Error,
}

impl FileOperationError {
    /// Create a new file operation error from context and IO error
    pub fn new(context: FileOperationContext, source: std::io::Error) -> Self {
        Self {
            operation: context.operation,
            file_path: context.file_path,
            purpose: context.purpose,
            caller: context.caller,
            source,
        }
    }

    /// The path the failing operation was touching.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Get a user-friendly error message with a hint for the common IO failure kinds
    pub fn user_message(&self) -> String {
        let mut message = self.to_string();

        match self.source.kind() {
            std::io::ErrorKind::NotFound => {
                message.push_str("\n\nThe path does not exist.");
            }
            std::io::ErrorKind::PermissionDenied => {
                message.push_str(&format!(
                    "\n\nPermission denied. Check permissions for: {}",
                    self.file_path.display()
                ));
            }
            _ => {
                message.push_str(&format!("\n\nError details: {}", self.source));
            }
        }

        message
    }
}

/// Extension trait for Result types to add file operation context
pub trait FileResultExt<T> {
    /// Add file operation context to a Result
    fn with_file_context(
        self,
        operation: FileOperation,
        file_path: impl Into<PathBuf>,
        purpose: impl Into<String>,
        caller: impl Into<String>,
    ) -> Result<T, FileOperationError>;
}

impl<T> FileResultExt<T> for Result<T, std::io::Error> {
    fn with_file_context(
        self,
        operation: FileOperation,
        file_path: impl Into<PathBuf>,
        purpose: impl Into<String>,
        caller: impl Into<String>,
    ) -> Result<T, FileOperationError> {
        self.map_err(|io_error| {
            let context = FileOperationContext::new(operation, file_path, purpose, caller);
            FileOperationError::new(context, io_error)
        })
    }
}
