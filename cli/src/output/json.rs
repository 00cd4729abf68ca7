//! JSON output helpers.
//!
//! `JsonRenderer` prints one pretty-printed object per command on stdout.
//! `format_error` builds the object printed instead when a command fails.

use anyhow::{Context, Result};
use daybook_common::{DaybookError, Service};
use serde::Serialize;

use crate::application::services::PullSummary;
use crate::domain::{ConfigError, PatternEntry};

/// Machine-readable renderer used with `--json`.
pub struct JsonRenderer;

impl JsonRenderer {
    fn print(value: &impl Serialize) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("JSON serialization failed")?
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_pull(&self, summary: &PullSummary) -> Result<()> {
        Self::print(summary)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_push(&self, service: &Service, key: &str, size: u64, sha256: &str) -> Result<()> {
        Self::print(&serde_json::json!({
            "service": service.name,
            "version": service.version,
            "key": key,
            "size": size,
            "sha256": sha256,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_services(&self, pattern: &str, services: Option<&[String]>) -> Result<()> {
        Self::print(&serde_json::json!({
            "pattern": pattern,
            "services": services,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_entries(&self, entries: &[PatternEntry]) -> Result<()> {
        Self::print(&serde_json::json!({ "entries": entries }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_resolution(&self, host: &str, services: &[Service]) -> Result<()> {
        let names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
        Self::print(&serde_json::json!({ "host": host, "services": names }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_versions(&self, name: &str, versions: &[Service]) -> Result<()> {
        let versions: Vec<&str> = versions.iter().filter_map(Service::version).collect();
        Self::print(&serde_json::json!({ "service": name, "versions": versions }))
    }
}

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable machine-readable code for a command failure.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<DaybookError>() {
            return match e {
                DaybookError::Transport { .. } => "transport",
                DaybookError::NotFound { .. } => "not_found",
                DaybookError::UnsupportedFormat(_) => "unsupported_format",
                DaybookError::MalformedPattern { .. } => "malformed_pattern",
                DaybookError::Io { .. } => "io",
                DaybookError::InvalidService(_) => "invalid_service",
                DaybookError::UnsafeEntryPath(_) => "unsafe_entry_path",
                DaybookError::ConcurrentModification { .. } => "concurrent_modification",
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return "config";
        }
    }
    "error"
}
