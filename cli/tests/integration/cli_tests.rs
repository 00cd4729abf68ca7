//! Integration tests for the CLI structure and argument parsing.

#![allow(clippy::expect_used)]

use predicates::prelude::*;

use crate::helpers::daybook;

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    daybook().assert().code(2).stderr(predicate::str::contains(
        "Pull-based artifact distribution for hosts",
    ));
}

#[test]
fn test_cli_help_lists_every_command() {
    daybook()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("pull"))
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("map"))
        .stdout(predicate::str::contains("versions"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    daybook()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("daybook 0.1.0"));
}

#[test]
fn test_map_help_lists_subcommands() {
    daybook()
        .args(["map", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("resolve"));
}

#[test]
fn test_pull_help_shows_overrides() {
    daybook()
        .args(["pull", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--hostname"))
        .stdout(predicate::str::contains("--install-dir"))
        .stdout(predicate::str::contains("--staged"));
}

// --- Global flags tests ---

#[test]
fn test_global_flags_accepted_after_subcommand() {
    daybook()
        .args(["map", "--help", "--json", "-q", "--no-color", "-vv"])
        .assert()
        .success();
}

// --- Error handling tests ---

#[test]
fn test_unknown_command_exits_with_error() {
    daybook()
        .arg("nonexistent")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_push_requires_service_version_and_path() {
    daybook()
        .args(["push", "api", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<PATH>"));
}

#[test]
fn test_map_add_requires_a_service() {
    daybook()
        .args(["map", "add", "web-*"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<SERVICES>"));
}
