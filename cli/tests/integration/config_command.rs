//! Integration tests for configuration loading.
//!
//! Every test points `--config-file` or `DAYBOOK_CONFIG` at a temp path so
//! `/etc/daybook.json` is never read.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;
use tempfile::TempDir;

use crate::helpers::{CLOSED_ADDR, config_file, daybook, daybook_with};

#[test]
fn test_malformed_json_reports_path_and_exits_one() {
    let (_dir, path) = config_file("daybook.json", "{ not json");
    daybook_with(&path)
        .args(["map", "resolve", "web-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error: Failed to parse config file"))
        .stderr(predicate::str::contains("daybook.json"));
}

#[test]
fn test_yaml_config_is_accepted() {
    let (_dir, path) = config_file(
        "daybook.yaml",
        "registry_prefix: \"fleet/\"\naws_region: eu-west-1\n",
    );
    // Parsing succeeds; the failure comes later from the missing credentials.
    daybook_with(&path)
        .args(["versions", "api"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("AWS access key missing"));
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let (_dir, path) = config_file("daybook.toml", "bucket_name = \"x\"");
    daybook_with(&path)
        .args(["map", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unsupported config file extension"));
}

#[test]
fn test_invalid_registry_prefix_is_rejected() {
    let (_dir, path) = config_file("daybook.json", r#"{"registry_prefix": "no-slash"}"#);
    daybook_with(&path)
        .args(["map", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("registry_prefix 'no-slash'"));
}

#[test]
fn test_config_error_in_json_mode_has_config_code() {
    let (_dir, path) = config_file("daybook.json", "42");
    let output = daybook_with(&path)
        .args(["--json", "map", "list"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "config");
}

#[test]
fn test_env_var_selects_config_file() {
    let (_dir, path) = config_file("custom.json", r#"{"http_timeout_secs": 0}"#);
    daybook()
        .env("DAYBOOK_CONFIG", &path)
        .args(["map", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("http_timeout_secs"));
}

#[test]
fn test_flag_overrides_env_var() {
    let (_bad_dir, bad) = config_file("bad.json", "{ not json");
    let (_good_dir, good) = config_file("good.json", "{}");
    daybook()
        .env("DAYBOOK_CONFIG", &bad)
        .arg("--config-file")
        .arg(&good)
        .args(["versions", "api"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("AWS access key missing"));
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    daybook_with(&dir.path().join("absent.json"))
        .args(["versions", "api"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("AWS access key missing"));
}

#[test]
fn test_credentials_come_from_environment() {
    let (_dir, path) = config_file(
        "daybook.json",
        &format!(r#"{{"s3_endpoint": "http://{CLOSED_ADDR}", "http_timeout_secs": 2}}"#),
    );
    // With credentials present the command gets as far as the network.
    daybook_with(&path)
        .env("AWS_ACCESS_KEY_ID", "AKIDENV")
        .env("AWS_SECRET_ACCESS_KEY", "secret")
        .args(["versions", "api"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("listing s3://daybook/api failed"));
}
