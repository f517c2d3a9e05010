//! Single-report HTTP handlers.

use crate::{error::HttpError, AppError, AppState};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use reportd_core::models::report::{ReportEntry, ReportUpload};
use reportd_core::text::normalize_optional_nonempty;
use reportd_core::TransactionOps;
use serde::{Deserialize, Serialize};

/// Response for a successful upload or update.
#[derive(Debug, Serialize)]
pub struct ReportWriteResponse {
    pub success: bool,
    pub message: &'static str,
    pub key: String,
    pub url: String,
    pub serve_url: String,
}

/// Public view of a registry entry.
#[derive(Debug, Serialize)]
pub struct ReportView {
    pub key: String,
    pub url: String,
    pub serve_url: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(rename = "lastAccessed", skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
}

impl ReportView {
    pub(crate) fn from_entry(entry: &ReportEntry, public_url: &str) -> Self {
        let url = entry.url();
        Self {
            key: entry.key.clone(),
            serve_url: format!("{}{}", public_url, url),
            url,
            created: entry.created_at,
            updated: entry.updated_at,
            last_accessed: entry.last_accessed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServeQuery {
    pub key: Option<String>,
}

fn write_response(
    state: &AppState,
    entry: &ReportEntry,
    message: &'static str,
) -> Json<ReportWriteResponse> {
    let view = ReportView::from_entry(entry, &state.config.public_url);
    Json(ReportWriteResponse {
        success: true,
        message,
        key: view.key,
        url: view.url,
        serve_url: view.serve_url,
    })
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn not_found_page(key: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html>\n<html>\n<body>\n<h1>Report Not Found</h1>\n\
         <p>Report with key \"{}\" does not exist.</p>\n\
         <a href=\"/reports\">View all reports</a>\n</body>\n</html>\n",
        escape_html(key)
    );
    (StatusCode::NOT_FOUND, Html(body)).into_response()
}

fn error_page() -> Response {
    let body = "<!DOCTYPE html>\n<html>\n<body>\n<h1>Error</h1>\n\
                <p>Failed to load report.</p>\n</body>\n</html>\n";
    (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
}

/// Store a new report.
///
/// # Arguments
/// - `state`: Application state.
/// - `req`: `{key, html}` payload.
///
/// # Returns
/// The report's URLs as JSON.
///
/// # Errors
/// Returns 400 for missing fields or a bad key, 409 when the key exists.
pub async fn upload_report(
    State(state): State<AppState>,
    Json(req): Json<ReportUpload>,
) -> Result<Json<ReportWriteResponse>, HttpError> {
    let item = req.into_item()?;
    let entry = TransactionOps::create_report(&state.db, &item.key, &item.body)?;
    Ok(write_response(&state, &entry, "Report uploaded successfully"))
}

/// Replace the body of an existing report.
///
/// # Returns
/// The report's URLs as JSON.
///
/// # Errors
/// Returns 400 for missing fields, 404 when the key does not exist.
pub async fn update_report(
    State(state): State<AppState>,
    Json(req): Json<ReportUpload>,
) -> Result<Json<ReportWriteResponse>, HttpError> {
    let item = req.into_item()?;
    let entry = TransactionOps::update_report(&state.db, &item.key, &item.body)?;
    Ok(write_response(&state, &entry, "Report updated successfully"))
}

/// Look up where a report is served from.
///
/// # Errors
/// Returns 400 when `key` is missing, 404 when it does not exist.
pub async fn serve_report(
    State(state): State<AppState>,
    Query(query): Query<ServeQuery>,
) -> Result<Json<ReportView>, HttpError> {
    let key = normalize_optional_nonempty(query.key)
        .ok_or_else(|| AppError::Validation("key parameter is required".to_string()))?;
    let entry = state
        .db
        .get_report_meta(&key)?
        .ok_or_else(|| AppError::report_not_found(&key))?;
    Ok(Json(ReportView::from_entry(&entry, &state.config.public_url)))
}

/// Report whether `key` exists, with metadata when it does.
///
/// # Errors
/// Returns 500 only when the registry is unavailable.
pub async fn report_exists(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let body = match state.db.get_report_meta(&key)? {
        Some(entry) => {
            let mut value = serde_json::to_value(ReportView::from_entry(
                &entry,
                &state.config.public_url,
            ))
            .map_err(|err| AppError::StorageMessage(err.to_string()))?;
            value["exists"] = serde_json::Value::Bool(true);
            value
        }
        None => serde_json::json!({ "exists": false, "key": key }),
    };
    Ok(Json(body))
}

/// Serve the stored HTML body and record the access.
///
/// Missing reports get an HTML not-found page rather than JSON.
pub async fn get_report(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.db.read_report_body(&key) {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(AppError::NotFound { .. }) => not_found_page(&key),
        Err(err) => {
            tracing::error!("Failed to serve report '{}': {}", key, err);
            error_page()
        }
    }
}

/// Delete a report and its group memberships.
///
/// # Errors
/// Returns 404 when the report does not exist.
pub async fn delete_report(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, HttpError> {
    if !TransactionOps::delete_report(&state.db, &key)? {
        return Err(AppError::report_not_found(&key).into());
    }
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Report deleted successfully",
        "key": key,
    })))
}

/// List every stored report.
///
/// # Returns
/// `{total, reports}` ordered by creation time.
pub async fn list_reports(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let reports: Vec<ReportView> = state
        .db
        .list_reports()?
        .iter()
        .map(|entry| ReportView::from_entry(entry, &state.config.public_url))
        .collect();
    Ok(Json(serde_json::json!({
        "total": reports.len(),
        "reports": reports,
    })))
}
