//! One-time registry rebuild from the content store at process start.

use super::Database;
use crate::error::AppError;
use crate::models::report::{key_from_storage_location, ReportEntry};
use crate::text::validate_report_key;

/// Outcome of [`Database::reconcile_from_storage`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub loaded: usize,
    pub skipped: usize,
    pub stale_temp_removed: usize,
}

impl Database {
    /// Replace the registry with one entry per report file on disk.
    ///
    /// Timestamps come from the filesystem; access times start empty because
    /// they are not persisted. Groups are not persisted either and start empty.
    ///
    /// # Returns
    /// Counts of loaded and skipped files and removed temp files.
    ///
    /// # Errors
    /// Returns an error if the reports directory cannot be created or listed.
    pub(crate) fn reconcile_from_storage(&self) -> Result<ReconcileReport, AppError> {
        self.content.ensure_root()?;
        let mut report = ReconcileReport {
            stale_temp_removed: self.content.remove_stale_temp_files()?,
            ..ReconcileReport::default()
        };
        if report.stale_temp_removed > 0 {
            tracing::warn!(
                "Removed {} interrupted write(s) from {}",
                report.stale_temp_removed,
                self.content.root().display()
            );
        }

        let stored = self.content.enumerate()?;
        let mut index = self.index()?;
        *index = Default::default();
        for item in stored {
            let Some(key) = key_from_storage_location(&item.location)
                .and_then(|key| validate_report_key(key).ok())
            else {
                tracing::warn!("Skipping unrecognized report file '{}'", item.location);
                report.skipped += 1;
                continue;
            };
            index.registry.restore(ReportEntry {
                key: key.to_string(),
                storage_location: item.location.clone(),
                created_at: item.created_at,
                updated_at: item.modified_at,
                last_accessed_at: None,
            });
            report.loaded += 1;
        }
        Ok(report)
    }
}
