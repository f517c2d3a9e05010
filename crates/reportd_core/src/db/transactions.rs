//! Mutations that keep content, registry, and groups consistent.
//!
//! Ordering rules:
//! - writes hit the content store before the registry commits the entry;
//! - deletes remove content before the registry entry and group memberships,
//!   so an entry never outlives readable content for longer than the delete
//!   itself takes.

use super::Database;
use crate::error::AppError;
use crate::models::report::{storage_location_for, BatchItem, BatchItemResult, ReportEntry};
use crate::text::{validate_group_id, validate_report_key};
use chrono::Utc;
use std::collections::{BTreeSet, HashSet};
use std::sync::MutexGuard;

/// Multi-step report mutations.
pub struct TransactionOps;

/// Guard that proves the caller holds the database write lock.
pub struct WriteGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

fn validate_item(key: &str, body: &[u8]) -> Result<(), AppError> {
    validate_report_key(key)?;
    if body.is_empty() {
        return Err(AppError::Validation(format!(
            "Report '{}' has an empty body",
            key
        )));
    }
    Ok(())
}

fn validate_batch(items: &[BatchItem]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::Validation(
            "Batch must contain at least one report".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    for item in items {
        validate_item(&item.key, &item.body)?;
        if !seen.insert(item.key.as_str()) {
            duplicates.insert(item.key.clone());
        }
    }
    if !duplicates.is_empty() {
        let duplicates: Vec<String> = duplicates.into_iter().collect();
        return Err(AppError::Validation(format!(
            "Duplicate keys in batch: {}",
            duplicates.join(", ")
        )));
    }
    Ok(())
}

impl TransactionOps {
    /// Acquire the database write lock.
    ///
    /// Every mutation of content or registry state must hold this guard for
    /// its full critical section, including the file I/O.
    ///
    /// # Errors
    /// Returns an error when the lock is poisoned.
    pub fn acquire_write_guard(db: &Database) -> Result<WriteGuard<'_>, AppError> {
        let guard = db
            .write_lock
            .lock()
            .map_err(|_| AppError::poisoned("Write"))?;
        Ok(WriteGuard { _guard: guard })
    }

    /// Store a new report.
    ///
    /// # Returns
    /// The committed registry entry.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for a bad key or empty body,
    /// [`AppError::Conflict`] when the key exists, or an I/O error when the
    /// content cannot be written (in which case nothing is registered).
    pub fn create_report(db: &Database, key: &str, body: &[u8]) -> Result<ReportEntry, AppError> {
        validate_item(key, body)?;
        let guard = Self::acquire_write_guard(db)?;
        Self::create_report_locked(db, &guard, key, body)
    }

    fn create_report_locked(
        db: &Database,
        _guard: &WriteGuard<'_>,
        key: &str,
        body: &[u8],
    ) -> Result<ReportEntry, AppError> {
        if db.index()?.registry.contains(key) {
            return Err(AppError::report_exists(key));
        }
        let location = storage_location_for(key);
        db.content.write(&location, body)?;
        let entry = db.index()?.registry.create(key, &location, Utc::now())?;
        tracing::info!("Created report '{}' ({} bytes)", key, body.len());
        Ok(entry)
    }

    /// Replace the body of an existing report.
    ///
    /// # Returns
    /// The entry with `updated_at` advanced.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for a bad key or empty body,
    /// [`AppError::NotFound`] when the key is absent, or an I/O error when the
    /// content cannot be written (the previous body stays in place).
    pub fn update_report(db: &Database, key: &str, body: &[u8]) -> Result<ReportEntry, AppError> {
        validate_item(key, body)?;
        let guard = Self::acquire_write_guard(db)?;
        Self::update_report_locked(db, &guard, key, body)
    }

    fn update_report_locked(
        db: &Database,
        _guard: &WriteGuard<'_>,
        key: &str,
        body: &[u8],
    ) -> Result<ReportEntry, AppError> {
        let location = db
            .index()?
            .registry
            .get(key)
            .map(|entry| entry.storage_location.clone())
            .ok_or_else(|| AppError::report_not_found(key))?;
        db.content.write(&location, body)?;
        let entry = db.index()?.registry.replace(key, &location, Utc::now())?;
        tracing::info!("Updated report '{}' ({} bytes)", key, body.len());
        Ok(entry)
    }

    /// Delete a report and its group memberships.
    ///
    /// # Returns
    /// `Ok(false)` when no such report exists.
    ///
    /// # Errors
    /// Returns an I/O error when the content cannot be removed; the entry is
    /// then left registered.
    pub fn delete_report(db: &Database, key: &str) -> Result<bool, AppError> {
        let guard = Self::acquire_write_guard(db)?;
        let deleted = Self::remove_report_locked(db, &guard, key)?;
        if deleted {
            tracing::info!("Deleted report '{}'", key);
        }
        Ok(deleted)
    }

    /// Shared deletion path for explicit deletes and eviction.
    ///
    /// Content that is already gone counts as deleted.
    ///
    /// # Returns
    /// `Ok(false)` when `key` is not registered.
    ///
    /// # Errors
    /// Returns an error when content deletion fails for a reason other than
    /// absence; registry and groups are left unchanged.
    pub fn remove_report_locked(
        db: &Database,
        _guard: &WriteGuard<'_>,
        key: &str,
    ) -> Result<bool, AppError> {
        let Some(location) = db
            .index()?
            .registry
            .get(key)
            .map(|entry| entry.storage_location.clone())
        else {
            return Ok(false);
        };

        if !db.content.delete(&location)? {
            tracing::warn!("Content for report '{}' was already gone", key);
        }

        let mut index = db.index()?;
        index.registry.remove(key);
        for group_id in index.groups.remove_key_everywhere(key) {
            tracing::debug!("Group '{}' removed after its last member '{}'", group_id, key);
        }
        Ok(true)
    }

    /// Upload a batch of new reports into `group_id`.
    ///
    /// The whole batch is validated before any write: duplicate keys within the
    /// batch are a validation error and keys already registered are a
    /// conflict. After that, items are written one by one and each gets its
    /// own result; a failed item is not registered or grouped.
    ///
    /// # Returns
    /// One [`BatchItemResult`] per item, in input order.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] or [`AppError::Conflict`] (listing the
    /// existing keys) when the pre-check fails; nothing is written then.
    pub fn upload_group(
        db: &Database,
        group_id: &str,
        items: Vec<BatchItem>,
    ) -> Result<Vec<BatchItemResult>, AppError> {
        validate_group_id(group_id)?;
        validate_batch(&items)?;

        let guard = Self::acquire_write_guard(db)?;
        {
            let index = db.index()?;
            let existing: Vec<String> = items
                .iter()
                .filter(|item| index.registry.contains(&item.key))
                .map(|item| item.key.clone())
                .collect();
            if !existing.is_empty() {
                return Err(AppError::Conflict {
                    message: format!("Keys already exist: {}", existing.join(", ")),
                    keys: existing,
                });
            }
        }

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let location = storage_location_for(&item.key);
            match db.content.write(&location, &item.body) {
                Ok(()) => {
                    let mut index = db.index()?;
                    let entry = index.registry.create(&item.key, &location, Utc::now())?;
                    index.groups.add_member(group_id, &item.key);
                    results.push(BatchItemResult::ok(entry));
                }
                Err(err) => {
                    tracing::error!(
                        "Failed to write report '{}' in group '{}': {}",
                        item.key,
                        group_id,
                        err
                    );
                    Self::discard_failed_upload(db, &guard, &item.key)?;
                    results.push(BatchItemResult::failed(item.key, err.to_string()));
                }
            }
        }

        let written = results.iter().filter(|r| r.success).count();
        tracing::info!(
            "Group '{}' upload: {} of {} report(s) written",
            group_id,
            written,
            results.len()
        );
        Ok(results)
    }

    fn discard_failed_upload(
        db: &Database,
        _guard: &WriteGuard<'_>,
        key: &str,
    ) -> Result<(), AppError> {
        if let Err(err) = db.content.delete(&storage_location_for(key)) {
            tracing::warn!("Failed to discard partial content for '{}': {}", key, err);
        }
        let mut index = db.index()?;
        index.registry.remove(key);
        index.groups.remove_key_everywhere(key);
        Ok(())
    }

    /// Replace the bodies of several existing reports.
    ///
    /// Every key must exist before anything is written. Items are then
    /// written one by one; a failed item keeps its previous body.
    ///
    /// # Returns
    /// One [`BatchItemResult`] per item, in input order.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for malformed or duplicate items, or
    /// [`AppError::NotFound`] listing every missing key.
    pub fn update_reports(
        db: &Database,
        items: Vec<BatchItem>,
    ) -> Result<Vec<BatchItemResult>, AppError> {
        validate_batch(&items)?;

        let guard = Self::acquire_write_guard(db)?;
        {
            let index = db.index()?;
            let missing: Vec<String> = items
                .iter()
                .filter(|item| !index.registry.contains(&item.key))
                .map(|item| item.key.clone())
                .collect();
            if !missing.is_empty() {
                return Err(AppError::NotFound {
                    message: format!("Keys not found: {}", missing.join(", ")),
                    keys: missing,
                });
            }
        }

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            match Self::update_report_locked(db, &guard, &item.key, &item.body) {
                Ok(entry) => results.push(BatchItemResult::ok(entry)),
                Err(err @ (AppError::Io(_) | AppError::NotFound { .. })) => {
                    tracing::error!("Failed to update report '{}': {}", item.key, err);
                    results.push(BatchItemResult::failed(item.key, err.to_string()));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(results)
    }
}
