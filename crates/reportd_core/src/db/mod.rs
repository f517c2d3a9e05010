//! Report storage: registry, grouping index, and content store.

/// Flat file content store.
pub mod content;
/// Group id to member key index.
pub mod groups;
/// Startup rebuild of the registry from stored content.
pub mod reconcile;
/// Key to metadata index.
pub mod registry;
/// Eviction scan over the registry.
pub mod sweep;
/// Mutations spanning content, registry, and groups.
pub mod transactions;

pub use content::ContentStore;
pub use groups::GroupIndex;
pub use reconcile::ReconcileReport;
pub use registry::Registry;
pub use transactions::{TransactionOps, WriteGuard};

use crate::error::AppError;
use crate::models::report::{GroupListing, ReportEntry};
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};

/// Registry and grouping index, always locked together.
#[derive(Debug, Default)]
pub struct IndexState {
    pub registry: Registry,
    pub groups: GroupIndex,
}

/// Shared handle over all report state.
///
/// `index` is held only for in-memory reads and commits. Mutations that
/// touch the content store additionally hold `write_lock` for their full
/// duration (see [`TransactionOps`]), so check-then-write sequences cannot
/// interleave with each other while readers stay unblocked during file I/O.
pub struct Database {
    pub content: ContentStore,
    index: Mutex<IndexState>,
    write_lock: Mutex<()>,
}

#[cfg(test)]
mod tests;

impl Database {
    /// Open the reports directory and rebuild the registry from its content.
    ///
    /// # Returns
    /// A ready [`Database`] holding one entry per stored report.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or listed.
    pub fn open(reports_dir: &str) -> Result<Self, AppError> {
        let db = Self {
            content: ContentStore::new(reports_dir),
            index: Mutex::new(IndexState::default()),
            write_lock: Mutex::new(()),
        };
        let report = db.reconcile_from_storage()?;
        tracing::info!(
            "Loaded {} existing report(s) from {}",
            report.loaded,
            db.content.root().display()
        );
        Ok(db)
    }

    /// Lock the registry and grouping index.
    ///
    /// # Errors
    /// Returns [`AppError::StorageMessage`] when the lock is poisoned.
    pub fn index(&self) -> Result<MutexGuard<'_, IndexState>, AppError> {
        self.index.lock().map_err(|_| AppError::poisoned("Registry"))
    }

    /// Metadata for `key`, if it exists.
    pub fn get_report_meta(&self, key: &str) -> Result<Option<ReportEntry>, AppError> {
        Ok(self.index()?.registry.get(key).cloned())
    }

    /// Read the body of `key` and record the access.
    ///
    /// Content that vanished between the lookup and the read (a concurrent
    /// delete or eviction) is reported as not found.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the report does not exist, or an
    /// I/O error when the content cannot be read.
    pub fn read_report_body(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let location = self
            .index()?
            .registry
            .get(key)
            .map(|entry| entry.storage_location.clone())
            .ok_or_else(|| AppError::report_not_found(key))?;

        let bytes = self
            .content
            .read(&location)?
            .ok_or_else(|| AppError::report_not_found(key))?;

        let now = Utc::now();
        self.index()?.registry.touch_access(key, now);
        tracing::debug!("Report '{}' accessed at {}", key, now.to_rfc3339());
        Ok(bytes)
    }

    /// Snapshot of every report entry.
    pub fn list_reports(&self) -> Result<Vec<ReportEntry>, AppError> {
        Ok(self.index()?.registry.list())
    }

    /// Number of reports currently registered.
    pub fn count(&self) -> Result<usize, AppError> {
        Ok(self.index()?.registry.count())
    }

    /// Member keys of `group_id`; empty when the group does not exist.
    pub fn group_members(&self, group_id: &str) -> Result<Vec<String>, AppError> {
        Ok(self.index()?.groups.members(group_id))
    }

    /// Every group with its member keys.
    pub fn list_groups(&self) -> Result<Vec<GroupListing>, AppError> {
        Ok(self.index()?.groups.list_groups())
    }
}
