//! Typed errors raised by the driver layer before any backend is contacted.
//!
//! Core failures use `daybook_common::DaybookError`; these cover loading and
//! validating the configuration file. Both convert to `anyhow::Error` via `?`.

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Unsupported config file extension: {path} (expected .json, .yaml or .yml)")]
    UnsupportedExtension { path: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
