//! Integration test suite for vcsdeps
//!
//! End-to-end tests of the settings loader chain, the checkout cache and the CLI.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **loader_chain**: settings evaluation through the standard loader chain
//! - **directory_repositories**: local directory repositories copied into the cache
//! - **guard_concurrency**: cross-process guard exclusion and cache cleaning
//! - **cli**: the `vcsdeps` binary

mod cli;
mod directory_repositories;
mod guard_concurrency;
mod loader_chain;
