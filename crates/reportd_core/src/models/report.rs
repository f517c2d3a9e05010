//! Report metadata tracked by the registry and the payloads that create it.

use crate::constants::{REPORT_FILE_EXTENSION, REPORT_URL_PREFIX};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registry metadata for one stored report.
///
/// The body lives in the content store under `storage_location`; the entry
/// exists only while that content does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportEntry {
    pub key: String,
    pub storage_location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl ReportEntry {
    /// Create a fresh entry stamped with `now`.
    ///
    /// # Returns
    /// An entry with `created_at == updated_at == now` and no access time.
    pub fn new(key: String, storage_location: String, now: DateTime<Utc>) -> Self {
        Self {
            key,
            storage_location,
            created_at: now,
            updated_at: now,
            last_accessed_at: None,
        }
    }

    /// Path under which the report body is served.
    pub fn url(&self) -> String {
        report_url(&self.key)
    }

    /// Timestamp idle time is measured from.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_accessed_at.unwrap_or(self.created_at)
    }
}

/// Path under which the report for `key` is served.
///
/// The key is percent-encoded as a single path segment, so `?`, `#`, `%`
/// and spaces in a key cannot change which resource the path names.
pub fn report_url(key: &str) -> String {
    format!("{}{}", REPORT_URL_PREFIX, urlencoding::encode(key))
}

/// Deterministic content-store location for `key`.
pub fn storage_location_for(key: &str) -> String {
    format!("{}.{}", key, REPORT_FILE_EXTENSION)
}

/// Inverse of [`storage_location_for`].
///
/// # Returns
/// The key when `location` carries the report extension, otherwise `None`.
pub fn key_from_storage_location(location: &str) -> Option<&str> {
    location
        .strip_suffix(REPORT_FILE_EXTENSION)
        .and_then(|stem| stem.strip_suffix('.'))
        .filter(|stem| !stem.is_empty())
}

/// Request payload for creating or replacing a single report.
///
/// Both fields are optional at the wire level so that missing values surface
/// as validation errors instead of extractor rejections.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportUpload {
    pub key: Option<String>,
    pub html: Option<String>,
}

impl ReportUpload {
    /// Split into a key and body, rejecting missing or empty values.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] when either field is missing or empty.
    pub fn into_item(self) -> Result<BatchItem, AppError> {
        match (self.key, self.html) {
            (Some(key), Some(html)) if !key.trim().is_empty() && !html.is_empty() => {
                Ok(BatchItem {
                    key,
                    body: html.into_bytes(),
                })
            }
            _ => Err(AppError::Validation(
                "Both html and key are required".to_string(),
            )),
        }
    }
}

/// Request payload for a batch upload into a group.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupUploadRequest {
    #[serde(rename = "groupId", alias = "group_id")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub reports: Vec<ReportUpload>,
}

/// Request payload for a batch replacement of existing reports.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchUpdateRequest {
    #[serde(default)]
    pub reports: Vec<ReportUpload>,
}

/// Validated key/body pair handed to batch operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub key: String,
    pub body: Vec<u8>,
}

/// Outcome of one item within a batch upload or update.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItemResult {
    pub key: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<ReportEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItemResult {
    pub(crate) fn ok(entry: ReportEntry) -> Self {
        Self {
            key: entry.key.clone(),
            success: true,
            entry: Some(entry),
            error: None,
        }
    }

    pub(crate) fn failed(key: String, error: String) -> Self {
        Self {
            key,
            success: false,
            entry: None,
            error: Some(error),
        }
    }
}

/// A group and its member keys, as returned by listings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GroupListing {
    #[serde(rename = "groupId")]
    pub group_id: String,
    pub keys: Vec<String>,
}
