//! Application error types for report storage and domain logic.
use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed input. Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// One or more keys collide with existing reports or with each other.
    #[error("Conflict: {message}")]
    Conflict { message: String, keys: Vec<String> },

    #[error("Not found: {message}")]
    NotFound { message: String, keys: Vec<String> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    StorageMessage(String),
}

impl AppError {
    /// Build a not-found error for a single key.
    ///
    /// # Returns
    /// [`AppError::NotFound`] naming `key`.
    pub fn report_not_found(key: &str) -> Self {
        Self::NotFound {
            message: format!("Report '{}' not found", key),
            keys: vec![key.to_string()],
        }
    }

    /// Build a conflict error for a single key.
    ///
    /// # Returns
    /// [`AppError::Conflict`] naming `key`.
    pub fn report_exists(key: &str) -> Self {
        Self::Conflict {
            message: format!("Report '{}' already exists", key),
            keys: vec![key.to_string()],
        }
    }

    /// Keys attached to a conflict or not-found error.
    ///
    /// # Returns
    /// The offending keys, or an empty slice for other variants.
    pub fn keys(&self) -> &[String] {
        match self {
            Self::Conflict { keys, .. } | Self::NotFound { keys, .. } => keys,
            _ => &[],
        }
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        Self::StorageMessage(format!("{} lock poisoned", what))
    }
}
