//! Config discovery tests
//!
//! Everything touching `WINDFEED_CONFIG` lives in a single test so the
//! process environment is never mutated concurrently.

use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;
use windfeed_app::load_config;
use windfeed_core::prelude::*;

#[test]
fn test_load_config_from_env_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dashboard.json");
    fs::write(
        &path,
        r#"{ "feed_path": "station/7/wind", "default_time_range": 12, "record_policy": "reject" }"#,
    )
    .unwrap();

    std::env::set_var("WINDFEED_CONFIG", &path);
    let config = load_config().unwrap();
    assert_eq!(config.feed_path, "station/7/wind");
    assert_eq!(config.default_time_range, TimeRange::new(12).unwrap());
    assert_eq!(config.record_policy, RecordPolicy::Reject);
    assert_eq!(config.time_range_options, TimeRange::DEFAULT_OPTIONS.to_vec());

    // A file named explicitly must exist
    std::env::set_var("WINDFEED_CONFIG", dir.path().join("missing.json"));
    let err = load_config().unwrap_err();
    assert!(err.to_string().contains("missing.json"));

    std::env::remove_var("WINDFEED_CONFIG");
}
