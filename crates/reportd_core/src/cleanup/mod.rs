//! Age- and idle-based eviction rules.

use crate::models::{cleanup::CleanupConfig, report::ReportEntry};
use chrono::{DateTime, Utc};
use std::fmt;

/// Thresholds captured from [`CleanupConfig`] at the start of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    pub max_age_ms: u64,
    pub max_idle_ms: u64,
}

/// Result of evaluating one entry against an [`EvictionPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionDecision {
    Retain,
    /// Older than `max_age_ms`; reads do not prevent this.
    ExceededMaxAge { age_ms: i64 },
    /// Not read (or, if never read, not created) within `max_idle_ms`.
    Idle { idle_ms: i64 },
}

impl EvictionDecision {
    pub fn should_evict(&self) -> bool {
        !matches!(self, Self::Retain)
    }
}

impl fmt::Display for EvictionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const HOUR_MS: i64 = 60 * 60 * 1000;
        const DAY_MS: i64 = 24 * HOUR_MS;
        match self {
            Self::Retain => f.write_str("retained"),
            Self::ExceededMaxAge { age_ms } => write!(
                f,
                "exceeded max age ({} days, {}ms old)",
                age_ms / DAY_MS,
                age_ms
            ),
            Self::Idle { idle_ms } => write!(
                f,
                "not accessed for {} hours ({}ms)",
                idle_ms / HOUR_MS,
                idle_ms
            ),
        }
    }
}

fn threshold(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

impl EvictionPolicy {
    /// Snapshot the thresholds of `config`.
    pub fn from_config(config: &CleanupConfig) -> Self {
        Self {
            max_age_ms: config.max_age_ms,
            max_idle_ms: config.max_idle_ms,
        }
    }

    /// Decide whether `entry` is expired at `now`.
    ///
    /// Age is checked first. Idle time falls back to `created_at` for entries
    /// that were never read. Both comparisons are strict.
    pub fn evaluate(&self, entry: &ReportEntry, now: DateTime<Utc>) -> EvictionDecision {
        let age_ms = (now - entry.created_at).num_milliseconds();
        if age_ms > threshold(self.max_age_ms) {
            return EvictionDecision::ExceededMaxAge { age_ms };
        }
        let idle_ms = (now - entry.last_activity()).num_milliseconds();
        if idle_ms > threshold(self.max_idle_ms) {
            return EvictionDecision::Idle { idle_ms };
        }
        EvictionDecision::Retain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::storage_location_for;
    use chrono::Duration;

    const POLICY: EvictionPolicy = EvictionPolicy {
        max_age_ms: 10_000,
        max_idle_ms: 2_000,
    };

    fn entry_created_at(created_at: DateTime<Utc>) -> ReportEntry {
        ReportEntry::new("k".to_string(), storage_location_for("k"), created_at)
    }

    #[test]
    fn old_entries_are_evicted_even_when_recently_read() {
        let now = Utc::now();
        let mut entry = entry_created_at(now - Duration::milliseconds(10_001));
        entry.last_accessed_at = Some(now);
        assert!(matches!(
            POLICY.evaluate(&entry, now),
            EvictionDecision::ExceededMaxAge { age_ms: 10_001 }
        ));
    }

    #[test]
    fn never_read_entries_measure_idle_from_creation() {
        let now = Utc::now();
        let entry = entry_created_at(now - Duration::milliseconds(2_001));
        assert_eq!(
            POLICY.evaluate(&entry, now),
            EvictionDecision::Idle { idle_ms: 2_001 }
        );
    }

    #[test]
    fn recent_reads_keep_entries_alive_under_max_age() {
        let now = Utc::now();
        let mut entry = entry_created_at(now - Duration::milliseconds(9_000));
        entry.last_accessed_at = Some(now - Duration::milliseconds(1_000));
        assert_eq!(POLICY.evaluate(&entry, now), EvictionDecision::Retain);
    }

    #[test]
    fn thresholds_are_strict() {
        let now = Utc::now();
        let at_idle_limit = entry_created_at(now - Duration::milliseconds(2_000));
        assert_eq!(POLICY.evaluate(&at_idle_limit, now), EvictionDecision::Retain);

        let mut at_age_limit = entry_created_at(now - Duration::milliseconds(10_000));
        at_age_limit.last_accessed_at = Some(now);
        assert_eq!(POLICY.evaluate(&at_age_limit, now), EvictionDecision::Retain);
    }

    #[test]
    fn huge_thresholds_never_overflow() {
        let policy = EvictionPolicy {
            max_age_ms: u64::MAX,
            max_idle_ms: u64::MAX,
        };
        let now = Utc::now();
        let entry = entry_created_at(now - Duration::days(3650));
        assert_eq!(policy.evaluate(&entry, now), EvictionDecision::Retain);
    }

    #[test]
    fn decision_display_names_the_reason() {
        let age = EvictionDecision::ExceededMaxAge {
            age_ms: 8 * 24 * 60 * 60 * 1000,
        };
        assert!(age.to_string().contains("8 days"));
        let idle = EvictionDecision::Idle {
            idle_ms: 25 * 60 * 60 * 1000,
        };
        assert!(idle.to_string().contains("25 hours"));
    }
}
