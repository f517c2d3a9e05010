//! HTTP request handlers.

/// Eviction trigger and configuration endpoints.
pub mod cleanup;
/// Batch upload/update and group listing endpoints.
pub mod group;
pub mod health;
/// Single-report endpoints.
pub mod report;
