//! Shared constants used across reportd crates.

/// Default API port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default directory holding one content file per report.
pub const DEFAULT_REPORTS_DIR: &str = "./reports";

/// Default maximum report body size accepted by the API layer.
pub const DEFAULT_MAX_REPORT_SIZE: usize = 64 * 1024 * 1024;

/// Default period between scheduled eviction scans.
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 30 * 60 * 1000;
/// Default idle threshold after which an unread report is evicted.
pub const DEFAULT_MAX_IDLE_MS: u64 = 24 * 60 * 60 * 1000;
/// Default absolute age after which a report is evicted regardless of reads.
pub const DEFAULT_MAX_AGE_MS: u64 = 7 * 24 * 60 * 60 * 1000;
/// Delay before the first scan after the scheduler (re)starts.
pub const DEFAULT_CLEANUP_STARTUP_DELAY_MS: u64 = 5_000;

/// File extension of persisted report bodies.
pub const REPORT_FILE_EXTENSION: &str = "html";
/// Suffix of in-progress write files, removed during startup reconciliation.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";
/// Upper bound on key length so the derived file name stays portable.
pub const MAX_KEY_LEN: usize = 200;

/// URL prefix under which report bodies are served.
pub const REPORT_URL_PREFIX: &str = "/report/";
