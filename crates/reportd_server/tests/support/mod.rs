//! Shared integration-test server bootstrap helpers.

#![allow(dead_code)]

use axum_test::TestServer;
use reportd_core::models::cleanup::CleanupConfig;
use reportd_server::{create_app, AppState, Config, Database};
use std::path::Path;
use tempfile::TempDir;

pub(crate) const TEST_PUBLIC_URL: &str = "http://reports.test";

pub(crate) fn test_config_for_dir(reports_dir: &Path) -> Config {
    Config {
        reports_dir: reports_dir.to_str().expect("reports path").to_string(),
        port: 0,
        max_report_size: 1_000_000,
        public_url: TEST_PUBLIC_URL.to_string(),
        cleanup: CleanupConfig {
            enabled: true,
            scan_interval_ms: 60_000,
            max_idle_ms: 3_600_000,
            max_age_ms: 86_400_000,
        },
        cleanup_startup_delay_ms: 60_000,
    }
}

pub(crate) fn test_server_for_config(config: Config) -> (TestServer, AppState) {
    let db = Database::open(&config.reports_dir).expect("open db");
    let state = AppState::new(config, db);
    let app = create_app(state.clone(), false);
    let server = TestServer::new(app).expect("server");
    (server, state)
}

pub(crate) fn setup_test_server() -> (TestServer, AppState, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config_for_dir(&temp_dir.path().join("reports"));
    let (server, state) = test_server_for_config(config);
    (server, state, temp_dir)
}
