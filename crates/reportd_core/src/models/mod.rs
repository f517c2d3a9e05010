//! Data models for reports, groups, and cleanup settings.

/// Cleanup configuration and scan summaries.
pub mod cleanup;
/// Report registry entries and request payloads.
pub mod report;
