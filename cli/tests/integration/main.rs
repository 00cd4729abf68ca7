//! Integration tests for daybook CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior. None of
//! them needs a running Consul agent or S3 endpoint: backends point at a
//! closed local port where a network failure is the expected outcome.

mod cli_tests;
mod config_command;
mod helpers;
mod push_command;
