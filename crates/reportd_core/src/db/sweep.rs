//! One eviction pass over the registry.

use super::{Database, TransactionOps};
use crate::cleanup::{EvictionDecision, EvictionPolicy};
use crate::error::AppError;
use crate::models::cleanup::CleanupSummary;
use chrono::{DateTime, Utc};

impl Database {
    /// Evict every entry that `policy` marks as expired at `now`.
    ///
    /// Candidates come from a snapshot of the registry. Each one is
    /// re-evaluated under the write lock before removal, so reports deleted,
    /// read, or replaced since the snapshot are judged on their current state.
    /// A failure to delete one report is logged and counted and does not stop
    /// the scan.
    ///
    /// # Returns
    /// Checked, deleted, failed, and remaining counts.
    ///
    /// # Errors
    /// Returns an error only when a lock is poisoned.
    pub fn sweep_expired(
        &self,
        policy: &EvictionPolicy,
        now: DateTime<Utc>,
    ) -> Result<CleanupSummary, AppError> {
        tracing::info!("Starting cleanup of expired reports");
        let snapshot = self.list_reports()?;
        let mut summary = CleanupSummary {
            checked: snapshot.len(),
            ..CleanupSummary::default()
        };

        for candidate in snapshot {
            if !policy.evaluate(&candidate, now).should_evict() {
                continue;
            }

            let guard = TransactionOps::acquire_write_guard(self)?;
            let decision = match self.index()?.registry.get(&candidate.key) {
                Some(current) => policy.evaluate(current, now),
                None => EvictionDecision::Retain,
            };
            if !decision.should_evict() {
                continue;
            }

            match TransactionOps::remove_report_locked(self, &guard, &candidate.key) {
                Ok(true) => {
                    summary.deleted += 1;
                    tracing::info!("Deleted report '{}' - {}", candidate.key, decision);
                }
                Ok(false) => {}
                Err(err @ AppError::Io(_)) => {
                    summary.failed += 1;
                    tracing::error!("Failed to delete report '{}': {}", candidate.key, err);
                }
                Err(err) => return Err(err),
            }
        }

        summary.remaining = self.count()?;
        tracing::info!(
            "Cleanup completed: checked {}, deleted {}, failed {}, remaining {}",
            summary.checked,
            summary.deleted,
            summary.failed,
            summary.remaining
        );
        Ok(summary)
    }
}
