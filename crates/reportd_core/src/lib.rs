//! Core domain library for reportd (config, report storage, eviction policy).

/// Eviction policy evaluation.
pub mod cleanup;
/// Configuration loading and defaults.
pub mod config;
/// Shared defaults used across reportd crates.
pub mod constants;
/// Report registry, grouping index, and content store.
pub mod db;
/// Application error types (storage/domain).
pub mod error;
/// Data models for API requests and registry state.
pub mod models;
/// Key and identifier normalization helpers.
pub mod text;

#[cfg(test)]
pub(crate) mod test_support;

pub use cleanup::{EvictionDecision, EvictionPolicy};
pub use config::Config;
pub use constants::DEFAULT_PORT;
pub use db::{Database, TransactionOps};
pub use error::AppError;
