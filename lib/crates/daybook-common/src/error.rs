//! Typed errors shared by the registry, the artifact store and the extractor.
//!
//! Messages carry the pattern, service or path involved but never the
//! underlying cause; the cause is exposed through `source()` so that
//! `anyhow`'s alternate formatting (`{:#}`) prints each layer once.

use thiserror::Error;

/// Boxed cause of a backend failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the daybook core.
pub type Result<T, E = DaybookError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DaybookError {
    /// Network or backend failure. Never retried by the core.
    #[error("{operation} failed")]
    Transport {
        operation: String,
        #[source]
        source: BoxError,
    },

    /// A pattern key, or an artifact under every recognized extension, is absent.
    #[error("{what} not found")]
    NotFound { what: String },

    /// Unrecognized local file suffix or unhandled archive entry type.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed pattern '{pattern}': {reason}")]
    MalformedPattern { pattern: String, reason: String },

    /// Filesystem failure while storing or extracting.
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid service: {0}")]
    InvalidService(String),

    /// Archive entry that is absolute or climbs out of the install root.
    #[error("archive entry '{0}' escapes the extraction root")]
    UnsafeEntryPath(String),

    #[error("pattern '{pattern}' was modified concurrently ({attempts} attempts)")]
    ConcurrentModification { pattern: String, attempts: u32 },
}

impl DaybookError {
    pub fn transport(operation: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            operation: operation.into(),
            source: source.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// `true` for "nothing there" outcomes, which callers usually treat as
    /// "nothing to do" rather than as a failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
