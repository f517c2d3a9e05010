//! Database integration tests.

use super::*;
use crate::cleanup::EvictionPolicy;
use crate::error::AppError;
use crate::models::report::*;
use crate::test_support::{
    assert_groups_match_registry, assert_registry_matches_content, backdate, setup_temp_db,
};
use chrono::{Duration, Utc};
use std::sync::{Arc, Barrier};
use std::thread;

fn item(key: &str, body: &str) -> BatchItem {
    BatchItem {
        key: key.to_string(),
        body: body.as_bytes().to_vec(),
    }
}

mod eviction;
