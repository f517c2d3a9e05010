//! Eviction settings and scan results.

use serde::{Deserialize, Serialize};

/// Process-wide eviction settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CleanupConfig {
    pub enabled: bool,
    pub scan_interval_ms: u64,
    pub max_idle_ms: u64,
    pub max_age_ms: u64,
}

/// Partial update to [`CleanupConfig`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupConfigPatch {
    pub enabled: Option<bool>,
    pub scan_interval_ms: Option<u64>,
    pub max_idle_ms: Option<u64>,
    pub max_age_ms: Option<u64>,
}

/// What [`CleanupConfig::apply`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigChanges {
    /// Human-readable `field: old -> new` lines.
    pub changes: Vec<String>,
    /// Supplied fields rejected by validation.
    pub ignored: Vec<String>,
    pub interval_changed: bool,
}

impl CleanupConfig {
    /// Apply a partial update, validating each field on its own.
    ///
    /// Durations must be positive; a zero duration is ignored and reported.
    ///
    /// # Returns
    /// The accepted changes and the ignored field names.
    pub fn apply(&mut self, patch: CleanupConfigPatch) -> ConfigChanges {
        let mut out = ConfigChanges::default();

        if let Some(enabled) = patch.enabled {
            out.changes
                .push(format!("enabled: {} -> {}", self.enabled, enabled));
            self.enabled = enabled;
        }

        let mut apply_duration = |name: &str, slot: &mut u64, value: Option<u64>| -> bool {
            match value {
                Some(0) => {
                    out.ignored.push(name.to_string());
                    false
                }
                Some(ms) => {
                    out.changes.push(format!("{}: {}ms -> {}ms", name, slot, ms));
                    *slot = ms;
                    true
                }
                None => false,
            }
        };

        let interval_set = apply_duration(
            "scanIntervalMs",
            &mut self.scan_interval_ms,
            patch.scan_interval_ms,
        );
        apply_duration("maxIdleMs", &mut self.max_idle_ms, patch.max_idle_ms);
        apply_duration("maxAgeMs", &mut self.max_age_ms, patch.max_age_ms);
        out.interval_changed = interval_set;
        out
    }
}

/// Counts reported at the end of one eviction scan.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CleanupSummary {
    pub checked: usize,
    pub deleted: usize,
    pub failed: usize,
    pub remaining: usize,
}
