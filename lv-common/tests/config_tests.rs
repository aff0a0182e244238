//! Integration tests for configuration loading
//!
//! Covers:
//! - Missing default config file → warning + defaults (never fatal)
//! - Missing explicit config file → error
//! - `LYRICVAULT_CONFIG` locates the file
//! - TOML sections override compiled defaults
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that set or clear LYRICVAULT_CONFIG are marked with #[serial].

use lv_common::config::{AppConfig, ConflictPolicy, CONFIG_ENV_VAR};
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

const SAMPLE_CONFIG: &str = r#"
database_path = "/tmp/lyricvault-test.db"

[server]
host = "0.0.0.0"
port = 8088

[crawl]
catalog_url = "http://localhost:9999/songs"
max_concurrency = 2
conflict_policy = "skip_record"
year_range = { from = 2020, to = 2021, url_template = "http://localhost:9999/songs/tamil-{year}-songs/" }

[selectors]
song_name = ".title"

[schedule]
enabled = false
crawl_at = "05:30"
"#;

#[test]
#[serial]
fn test_env_var_locates_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, SAMPLE_CONFIG).unwrap();

    env::set_var(CONFIG_ENV_VAR, &path);
    let config = AppConfig::load(None);
    env::remove_var(CONFIG_ENV_VAR);

    let config = config.unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.crawl.max_concurrency, 2);
    assert_eq!(config.crawl.conflict_policy, ConflictPolicy::SkipRecord);
    assert!(!config.schedule.enabled);

    // Unset selectors keep their defaults
    assert_eq!(config.selectors.song_name, ".title");
    assert_eq!(config.selectors.download_link, ".downloadinfo > a");

    let urls = config.crawl.year_range.unwrap().urls();
    assert_eq!(
        urls,
        vec![
            "http://localhost:9999/songs/tamil-2020-songs/",
            "http://localhost:9999/songs/tamil-2021-songs/",
        ]
    );
}

#[test]
#[serial]
fn test_missing_default_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    env::set_var(CONFIG_ENV_VAR, dir.path().join("does-not-exist.toml"));
    let config = AppConfig::load(None);
    env::remove_var(CONFIG_ENV_VAR);

    let config = config.unwrap();
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.crawl.max_concurrency, 8);
    assert_eq!(config.crawl.conflict_policy, ConflictPolicy::DropBatch);
    assert_eq!(config.auth.token_ttl_hours, 24);
}

#[test]
fn test_missing_explicit_file_is_error() {
    let dir = TempDir::new().unwrap();
    let result = AppConfig::load(Some(&dir.path().join("nope.toml")));
    assert!(result.is_err());
}

#[test]
fn test_invalid_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[crawl]\nmax_concurrency = 0\n").unwrap();

    let err = AppConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("max_concurrency"));
}
