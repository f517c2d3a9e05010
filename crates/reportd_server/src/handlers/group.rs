//! Batch and group HTTP handlers.

use crate::{error::HttpError, AppError, AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use reportd_core::models::report::{
    BatchItem, BatchItemResult, BatchUpdateRequest, GroupListing, GroupUploadRequest,
    ReportUpload,
};
use reportd_core::text::normalize_optional_nonempty;
use reportd_core::TransactionOps;
use serde::Serialize;

/// Per-item outcome of a batch request.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    #[serde(rename = "groupId", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchItemResult>,
}

impl BatchResponse {
    fn new(group_id: Option<String>, results: Vec<BatchItemResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            success: succeeded == results.len(),
            group_id,
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}

fn into_items(reports: Vec<ReportUpload>) -> Result<Vec<BatchItem>, AppError> {
    reports.into_iter().map(ReportUpload::into_item).collect()
}

/// Upload several new reports into one group.
///
/// # Arguments
/// - `state`: Application state.
/// - `req`: `{groupId, reports: [{key, html}]}` payload.
///
/// # Returns
/// One result per report, in request order.
///
/// # Errors
/// Returns 400 for a missing group id, an empty batch, or duplicate keys, and
/// 409 listing keys that already exist. Nothing is written in either case.
pub async fn upload_group(
    State(state): State<AppState>,
    Json(req): Json<GroupUploadRequest>,
) -> Result<Json<BatchResponse>, HttpError> {
    let group_id = normalize_optional_nonempty(req.group_id)
        .ok_or_else(|| AppError::Validation("groupId is required".to_string()))?;
    let items = into_items(req.reports)?;
    let results = TransactionOps::upload_group(&state.db, &group_id, items)?;
    Ok(Json(BatchResponse::new(Some(group_id), results)))
}

/// Replace the bodies of several existing reports.
///
/// # Returns
/// One result per report, in request order.
///
/// # Errors
/// Returns 400 for malformed items and 404 listing keys that do not exist.
pub async fn update_group(
    State(state): State<AppState>,
    Json(req): Json<BatchUpdateRequest>,
) -> Result<Json<BatchResponse>, HttpError> {
    let items = into_items(req.reports)?;
    let results = TransactionOps::update_reports(&state.db, items)?;
    Ok(Json(BatchResponse::new(None, results)))
}

/// List all groups with their member keys.
pub async fn list_groups(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let groups = state.db.list_groups()?;
    Ok(Json(serde_json::json!({
        "total": groups.len(),
        "groups": groups,
    })))
}

/// Member keys of one group.
///
/// # Errors
/// Returns 404 when the group does not exist.
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupListing>, HttpError> {
    let keys = state.db.group_members(&group_id)?;
    if keys.is_empty() {
        return Err(AppError::NotFound {
            message: format!("Group '{}' not found", group_id),
            keys: Vec::new(),
        }
        .into());
    }
    Ok(Json(GroupListing { group_id, keys }))
}
