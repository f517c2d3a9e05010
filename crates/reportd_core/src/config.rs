//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_CLEANUP_STARTUP_DELAY_MS, DEFAULT_MAX_AGE_MS, DEFAULT_MAX_IDLE_MS,
    DEFAULT_MAX_REPORT_SIZE, DEFAULT_PORT, DEFAULT_REPORTS_DIR, DEFAULT_SCAN_INTERVAL_MS,
};
use crate::models::cleanup::CleanupConfig;
use crate::text::normalize_optional_nonempty;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Runtime configuration for reportd.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub reports_dir: String,
    pub port: u16,
    pub max_report_size: usize,
    /// Absolute base used to build `serve_url` values in API responses.
    pub public_url: String,
    /// Initial eviction settings; mutable at runtime through the scheduler.
    pub cleanup: CleanupConfig,
    pub cleanup_startup_delay_ms: u64,
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    None
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
///
/// # Returns
/// `true` when the value is a recognized truthy value.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn parse_positive_ms(value: Option<String>) -> Option<u64> {
    value
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary name-to-value lookup.
    ///
    /// Unparseable or non-positive numeric values fall back to defaults.
    /// Cleanup stays enabled unless `CLEANUP_ENABLED` is a recognized falsy
    /// value.
    ///
    /// # Returns
    /// A populated [`Config`].
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let public_url = normalize_optional_nonempty(lookup("PUBLIC_URL"))
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));
        let cleanup_enabled = lookup("CLEANUP_ENABLED")
            .and_then(|value| parse_env_flag(&value))
            .unwrap_or(true);

        Self {
            reports_dir: normalize_optional_nonempty(lookup("REPORTS_DIR"))
                .map(expand_tilde)
                .unwrap_or_else(|| DEFAULT_REPORTS_DIR.to_string()),
            port,
            max_report_size: lookup("MAX_REPORT_SIZE")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_MAX_REPORT_SIZE),
            public_url,
            cleanup: CleanupConfig {
                enabled: cleanup_enabled,
                scan_interval_ms: parse_positive_ms(lookup("CLEANUP_INTERVAL"))
                    .unwrap_or(DEFAULT_SCAN_INTERVAL_MS),
                max_idle_ms: parse_positive_ms(lookup("MAX_IDLE_TIME"))
                    .unwrap_or(DEFAULT_MAX_IDLE_MS),
                max_age_ms: parse_positive_ms(lookup("MAX_AGE")).unwrap_or(DEFAULT_MAX_AGE_MS),
            },
            cleanup_startup_delay_ms: lookup("CLEANUP_STARTUP_DELAY")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_CLEANUP_STARTUP_DELAY_MS),
        }
    }
}
