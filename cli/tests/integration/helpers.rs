//! Command builders shared by the integration tests.

#![allow(dead_code, clippy::expect_used)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Address nothing listens on, so backend calls fail fast.
pub const CLOSED_ADDR: &str = "127.0.0.1:1";

/// `daybook` with colors off and no backend settings inherited from the
/// environment running the tests.
pub fn daybook() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("daybook"));
    cmd.env("NO_COLOR", "1");
    for var in [
        "DAYBOOK_CONFIG",
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "AWS_SESSION_TOKEN",
        "CONSUL_HTTP_ADDR",
        "CONSUL_HTTP_TOKEN",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Write `content` as `name` inside a fresh temp dir.
pub fn config_file(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write config");
    (dir, path)
}

/// Config pointing both backends at [`CLOSED_ADDR`], with dummy credentials.
pub fn offline_config() -> (TempDir, PathBuf) {
    config_file(
        "daybook.json",
        &format!(
            r#"{{
                "bucket_name": "artifacts",
                "aws_access_key": "AKIDTEST",
                "aws_secret_key": "secret",
                "s3_endpoint": "http://{CLOSED_ADDR}",
                "consul_addr": "{CLOSED_ADDR}",
                "http_timeout_secs": 2
            }}"#
        ),
    )
}

/// `daybook --config-file <path>`.
pub fn daybook_with(config: &Path) -> Command {
    let mut cmd = daybook();
    cmd.arg("--config-file").arg(config);
    cmd
}
