//! Core types shared by every vcsdeps module
//!
//! # Error Management
//!
//! - **Strongly-typed errors** ([`VcsError`]) for precise matching in code and tests
//! - **User-friendly contexts** ([`ErrorContext`]) with actionable suggestions for CLI users
//! - **File operation context** ([`FileOperationError`], [`FileResultExt`]) naming the
//!   operation, path and caller of a failing filesystem call
//!
//! # Examples
//!
//! ```rust
//! use vcsdeps::core::{VcsError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn load() -> Result<()> {
//!     Err(VcsError::ConfigError {
//!         message: "user_home must not be empty".to_string(),
//!     }
//!     .into())
//! }
//!
//! if let Err(e) = load() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.to_string().contains("user_home"));
//! }
//! ```

pub mod error;
pub mod file_error;

pub use error::{ErrorContext, VcsError, user_friendly_error};
pub use file_error::{FileOperation, FileOperationContext, FileOperationError, FileResultExt};
