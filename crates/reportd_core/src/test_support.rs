//! Shared test-only helpers for reportd_core.

use crate::Database;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tempfile::TempDir;

/// Creates an isolated reports directory and opens a database over it.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing files.
///
/// # Panics
/// Panics if temp-dir creation or database initialization fails.
pub(crate) fn setup_temp_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let reports_dir = temp_dir.path().join("reports");
    let db = Database::open(reports_dir.to_str().expect("reports path")).expect("db");
    (db, temp_dir)
}

/// Rewrite the timestamps of an existing entry.
///
/// # Panics
/// Panics when `key` is not registered.
pub(crate) fn backdate(
    db: &Database,
    key: &str,
    created_at: DateTime<Utc>,
    last_accessed_at: Option<DateTime<Utc>>,
) {
    let mut index = db.index().expect("index");
    let entry = index
        .registry
        .get(key)
        .cloned()
        .expect("entry to backdate");
    index.registry.restore(crate::models::report::ReportEntry {
        created_at,
        updated_at: created_at,
        last_accessed_at,
        ..entry
    });
}

/// Asserts that every group member is registered and no group is empty.
///
/// # Panics
/// Panics when a group references a missing key or has no members.
pub(crate) fn assert_groups_match_registry(db: &Database) {
    let index = db.index().expect("index");
    for group in index.groups.list_groups() {
        assert!(!group.keys.is_empty(), "group {} is empty", group.group_id);
        let dangling: BTreeSet<&String> = group
            .keys
            .iter()
            .filter(|key| !index.registry.contains(key))
            .collect();
        assert!(
            dangling.is_empty(),
            "group {} references missing keys: {:?}",
            group.group_id,
            dangling
        );
    }
}

/// Asserts that registry entries and report files on disk match one-to-one.
///
/// # Panics
/// Panics when either side has an entry the other lacks.
pub(crate) fn assert_registry_matches_content(db: &Database) {
    let on_disk: BTreeSet<String> = db
        .content
        .enumerate()
        .expect("enumerate")
        .into_iter()
        .map(|c| c.location)
        .collect();
    let registered: BTreeSet<String> = db
        .list_reports()
        .expect("list")
        .into_iter()
        .map(|e| e.storage_location)
        .collect();
    assert_eq!(registered, on_disk, "registry and content store diverged");
}
