//! Eviction trigger and configuration handlers.

use crate::{error::HttpError, AppState};
use axum::{extract::State, Json};
use chrono::Utc;
use reportd_core::models::cleanup::{CleanupConfig, CleanupConfigPatch};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub success: bool,
    pub message: &'static str,
    pub checked_reports: usize,
    pub deleted_reports: usize,
    pub failed_reports: usize,
    pub remaining_reports: usize,
    pub cleanup_config: CleanupConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStatusResponse {
    #[serde(flatten)]
    pub config: CleanupConfig,
    pub running: bool,
    pub scans_completed: u64,
    pub current_time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdateResponse {
    pub success: bool,
    pub message: &'static str,
    pub changes: Vec<String>,
    pub ignored: Vec<String>,
    pub new_config: CleanupConfig,
}

/// Split a JSON object into a typed patch plus the names of fields with the
/// wrong type.
///
/// Unknown fields are dropped. `enabled` must be a boolean and the durations
/// non-negative integers; zero durations pass through so the config layer can
/// reject them.
fn parse_patch(body: &Value) -> (CleanupConfigPatch, Vec<String>) {
    let mut patch = CleanupConfigPatch::default();
    let mut ignored = Vec::new();
    let Some(fields) = body.as_object() else {
        return (patch, ignored);
    };

    if let Some(value) = fields.get("enabled") {
        match value.as_bool() {
            Some(enabled) => patch.enabled = Some(enabled),
            None => ignored.push("enabled".to_string()),
        }
    }

    for (name, slot) in [
        ("scanIntervalMs", &mut patch.scan_interval_ms),
        ("maxIdleMs", &mut patch.max_idle_ms),
        ("maxAgeMs", &mut patch.max_age_ms),
    ] {
        if let Some(value) = fields.get(name) {
            match value.as_u64() {
                Some(ms) => *slot = Some(ms),
                None => ignored.push(name.to_string()),
            }
        }
    }
    (patch, ignored)
}

/// Run one eviction scan now.
///
/// When cleanup is disabled the scan is skipped and nothing is deleted.
///
/// # Errors
/// Returns 500 when the scan cannot run.
pub async fn trigger_cleanup(
    State(state): State<AppState>,
) -> Result<Json<CleanupResponse>, HttpError> {
    let summary = state.cleanup.trigger_now().await?;
    let config = state.cleanup.config()?;
    Ok(Json(CleanupResponse {
        success: true,
        message: if config.enabled {
            "Manual cleanup completed"
        } else {
            "Cleanup is disabled; no reports were checked"
        },
        checked_reports: summary.checked,
        deleted_reports: summary.deleted,
        failed_reports: summary.failed,
        remaining_reports: summary.remaining,
        cleanup_config: config,
    }))
}

/// Current eviction settings and timer status.
pub async fn get_cleanup_config(
    State(state): State<AppState>,
) -> Result<Json<CleanupStatusResponse>, HttpError> {
    Ok(Json(CleanupStatusResponse {
        config: state.cleanup.config()?,
        running: state.cleanup.is_running()?,
        scans_completed: state.cleanup.scans_completed(),
        current_time: Utc::now().to_rfc3339(),
    }))
}

/// Apply a partial configuration update.
///
/// Each supplied field is validated on its own; invalid ones are listed under
/// `ignored` and the rest are applied.
pub async fn update_cleanup_config(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<ConfigUpdateResponse>, HttpError> {
    let (patch, mut ignored) = parse_patch(&body);
    let applied = state.cleanup.apply(patch)?;
    ignored.extend(applied.ignored);
    if !ignored.is_empty() {
        tracing::warn!("Ignored invalid cleanup config fields: {}", ignored.join(", "));
    }

    Ok(Json(ConfigUpdateResponse {
        success: true,
        message: "Configuration updated",
        changes: applied.changes,
        ignored,
        new_config: state.cleanup.config()?,
    }))
}

#[cfg(test)]
mod tests {
    use super::parse_patch;
    use serde_json::json;

    #[test]
    fn parse_patch_rejects_wrong_types_per_field() {
        let (patch, ignored) = parse_patch(&json!({
            "enabled": "yes",
            "scanIntervalMs": 60000,
            "maxIdleMs": -5,
            "maxAgeMs": 1.5,
            "unknown": true,
        }));
        assert_eq!(patch.enabled, None);
        assert_eq!(patch.scan_interval_ms, Some(60000));
        assert_eq!(patch.max_idle_ms, None);
        assert_eq!(patch.max_age_ms, None);
        assert_eq!(ignored, vec!["enabled", "maxIdleMs", "maxAgeMs"]);
    }

    #[test]
    fn parse_patch_passes_zero_through_and_ignores_non_objects() {
        let (patch, ignored) = parse_patch(&json!({ "maxAgeMs": 0, "enabled": false }));
        assert_eq!(patch.max_age_ms, Some(0));
        assert_eq!(patch.enabled, Some(false));
        assert!(ignored.is_empty());

        let (patch, ignored) = parse_patch(&json!([1, 2]));
        assert_eq!(patch, Default::default());
        assert!(ignored.is_empty());
    }
}
