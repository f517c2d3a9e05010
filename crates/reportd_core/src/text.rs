//! Key and identifier normalization helpers.

use crate::constants::MAX_KEY_LEN;
use crate::error::AppError;

/// Trim an optional string and drop empty values.
///
/// # Returns
/// `None` when the input is missing or whitespace-only; otherwise the trimmed
/// string.
pub fn normalize_optional_nonempty(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Validate a caller-supplied report key.
///
/// Keys are opaque, but they name a file on disk, so anything that could
/// escape the reports directory or collide with temp files is rejected.
///
/// # Returns
/// The key unchanged when it is usable.
///
/// # Errors
/// Returns [`AppError::Validation`] describing the first violated rule.
pub fn validate_report_key(key: &str) -> Result<&str, AppError> {
    if key.trim().is_empty() {
        return Err(AppError::Validation("Report key is required".to_string()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(AppError::Validation(format!(
            "Report key exceeds {} bytes",
            MAX_KEY_LEN
        )));
    }
    if key.starts_with('.') {
        return Err(AppError::Validation(
            "Report key must not start with '.'".to_string(),
        ));
    }
    if key.chars().any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control()) {
        return Err(AppError::Validation(format!(
            "Report key '{}' contains a path separator or control character",
            key.escape_debug()
        )));
    }
    Ok(key)
}

/// Validate a caller-supplied group identifier.
///
/// # Errors
/// Returns [`AppError::Validation`] when the id is blank.
pub fn validate_group_id(group_id: &str) -> Result<&str, AppError> {
    if group_id.trim().is_empty() {
        return Err(AppError::Validation("Group id is required".to_string()));
    }
    Ok(group_id)
}
