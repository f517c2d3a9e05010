//! In-memory index of report metadata.

use crate::error::AppError;
use crate::models::report::ReportEntry;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Map from key to [`ReportEntry`].
///
/// Not synchronized; [`crate::Database`] owns it behind a mutex.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, ReportEntry>,
}

impl Registry {
    /// Insert a new entry stamped with `now`.
    ///
    /// # Errors
    /// Returns [`AppError::Conflict`] when `key` is already present.
    pub fn create(
        &mut self,
        key: &str,
        storage_location: &str,
        now: DateTime<Utc>,
    ) -> Result<ReportEntry, AppError> {
        if self.entries.contains_key(key) {
            return Err(AppError::report_exists(key));
        }
        let entry = ReportEntry::new(key.to_string(), storage_location.to_string(), now);
        self.entries.insert(key.to_string(), entry.clone());
        Ok(entry)
    }

    /// Record a content replacement for an existing entry.
    ///
    /// `created_at` and `last_accessed_at` are left untouched.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when `key` is absent.
    pub fn replace(
        &mut self,
        key: &str,
        storage_location: &str,
        now: DateTime<Utc>,
    ) -> Result<ReportEntry, AppError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| AppError::report_not_found(key))?;
        entry.storage_location = storage_location.to_string();
        entry.updated_at = now;
        Ok(entry.clone())
    }

    /// Insert an entry rebuilt from storage, replacing any previous one.
    pub(crate) fn restore(&mut self, entry: ReportEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    pub fn get(&self, key: &str) -> Option<&ReportEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Stamp a successful read. Absent keys are ignored.
    pub fn touch_access(&mut self, key: &str, now: DateTime<Utc>) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_accessed_at = Some(now);
        }
    }

    /// Remove `key`.
    ///
    /// # Returns
    /// `true` when an entry was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Snapshot of all entries, oldest first (ties broken by key).
    pub fn list(&self) -> Vec<ReportEntry> {
        let mut entries: Vec<ReportEntry> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.key.cmp(&b.key))
        });
        entries
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::error::AppError;
    use chrono::{Duration, Utc};

    #[test]
    fn create_rejects_duplicate_keys() {
        let mut registry = Registry::default();
        let now = Utc::now();
        registry.create("a", "a.html", now).expect("create");
        let err = registry
            .create("a", "a.html", now)
            .expect_err("duplicate should conflict");
        assert!(matches!(err, AppError::Conflict { .. }));
        assert_eq!(err.keys(), ["a".to_string()]);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn replace_only_advances_updated_at() {
        let mut registry = Registry::default();
        let created = Utc::now();
        registry.create("a", "a.html", created).expect("create");
        let read_at = created + Duration::seconds(1);
        registry.touch_access("a", read_at);

        let replaced_at = created + Duration::seconds(2);
        let entry = registry.replace("a", "a.html", replaced_at).expect("replace");
        assert_eq!(entry.created_at, created);
        assert_eq!(entry.updated_at, replaced_at);
        assert_eq!(entry.last_accessed_at, Some(read_at));
    }

    #[test]
    fn replace_missing_key_is_not_found_and_creates_nothing() {
        let mut registry = Registry::default();
        let err = registry
            .replace("ghost", "ghost.html", Utc::now())
            .expect_err("missing");
        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(!registry.contains("ghost"));
    }

    #[test]
    fn touch_access_on_missing_key_is_a_noop() {
        let mut registry = Registry::default();
        registry.touch_access("ghost", Utc::now());
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn list_is_a_snapshot_ordered_by_creation() {
        let mut registry = Registry::default();
        let base = Utc::now();
        registry.create("late", "late.html", base + Duration::seconds(5)).expect("create");
        registry.create("early", "early.html", base).expect("create");

        let listed = registry.list();
        registry.remove("early");

        let keys: Vec<&str> = listed.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["early", "late"]);
        assert_eq!(registry.count(), 1);
        assert!(!registry.remove("early"));
    }
}
