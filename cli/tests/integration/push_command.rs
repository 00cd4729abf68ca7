//! Integration tests for `daybook push`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;
use tempfile::TempDir;

use crate::helpers::{daybook_with, offline_config};

#[test]
fn test_push_rejects_unrecognized_archive_suffix() {
    let (_dir, config) = offline_config();
    let files = TempDir::new().unwrap();
    let archive = files.path().join("build.zip");
    std::fs::write(&archive, b"PK").unwrap();

    daybook_with(&config)
        .args(["push", "api", "1"])
        .arg(&archive)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("push of api/1 failed"))
        .stderr(predicate::str::contains("unsupported format"))
        .stderr(predicate::str::contains("tar.gz, tar"));
}

#[test]
fn test_push_unrecognized_suffix_json_code() {
    let (_dir, config) = offline_config();
    let output = daybook_with(&config)
        .args(["--json", "push", "api", "1", "/nonexistent/build.zip"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(value["code"], "unsupported_format");
}

#[test]
fn test_push_rejects_version_with_separator() {
    let (_dir, config) = offline_config();
    daybook_with(&config)
        .args(["push", "api", "1/2", "/nonexistent/build.tar.gz"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid service"));
}

#[test]
fn test_push_missing_file_reports_path() {
    let (_dir, config) = offline_config();
    daybook_with(&config)
        .args(["push", "api", "1", "/nonexistent/build.tar.gz"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("opening /nonexistent/build.tar.gz"));
}

#[test]
fn test_push_unreachable_store_is_transport_error() {
    let (_dir, config) = offline_config();
    let files = TempDir::new().unwrap();
    let archive = files.path().join("build.tar");
    std::fs::write(&archive, b"not really a tar").unwrap();

    daybook_with(&config)
        .args(["push", "api", "1"])
        .arg(&archive)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("uploading s3://artifacts/api-1.tar failed"));
}
