//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `daybook_common`, never
//! from `crate::infra`, `crate::commands`, or `crate::output`.
//!
//! Backend ports are blocking. The driver runs them off the async runtime.

use std::io::Read;
use std::path::{Path, PathBuf};

use daybook_common::{ArtifactFormat, DaybookConfig, Result};
use serde::Serialize;

// ── Value Types ───────────────────────────────────────────────────────────────

/// One key/value pair read from the KV backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: Vec<u8>,
    /// Backend modify index, compared by `put_if_revision`.
    pub revision: u64,
}

/// Exclusively owned byte stream from the object store.
pub type ObjectReader = Box<dyn Read + Send>;

/// An opened, not yet consumed artifact.
///
/// Owns the transport reader; dropping the stream (or consuming it through
/// an extractor) releases the reader exactly once.
pub struct ArchiveStream {
    key: String,
    format: ArtifactFormat,
    reader: ObjectReader,
}

impl ArchiveStream {
    #[must_use]
    pub fn new(key: impl Into<String>, format: ArtifactFormat, reader: ObjectReader) -> Self {
        Self {
            key: key.into(),
            format,
            reader,
        }
    }

    /// Object key the stream was opened from.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Format negotiated when the stream was opened.
    #[must_use]
    pub fn format(&self) -> &ArtifactFormat {
        &self.format
    }

    /// Give up the stream, keeping only the reader.
    #[must_use]
    pub fn into_reader(self) -> ObjectReader {
        self.reader
    }
}

impl std::fmt::Debug for ArchiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveStream")
            .field("key", &self.key)
            .field("format", &self.format.extension)
            .finish_non_exhaustive()
    }
}

/// Counts of what an extraction put on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractSummary {
    pub files: u64,
    pub directories: u64,
}

impl std::ops::AddAssign for ExtractSummary {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.directories += other.directories;
    }
}

// ── Registry Port ─────────────────────────────────────────────────────────────

/// Hierarchical key/value store holding pattern entries.
pub trait KvStore {
    /// Every entry whose key starts with `prefix`. An empty namespace is not an error.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the backend cannot be reached.
    fn list(&self, prefix: &str) -> Result<Vec<KvEntry>>;

    /// Entry stored under `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the backend cannot be reached.
    fn get(&self, key: &str) -> Result<Option<KvEntry>>;

    /// Unconditional write.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the backend cannot be reached.
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Write only if the stored revision still equals `expected`.
    /// `None` means "only if the key does not exist yet".
    ///
    /// Returns `false` when another writer got there first.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the backend cannot be reached.
    fn put_if_revision(&self, key: &str, value: &[u8], expected: Option<u64>) -> Result<bool>;
}

// ── Object Store Port ─────────────────────────────────────────────────────────

/// Flat blob store holding artifacts.
pub trait ObjectStore {
    /// Keys starting with `prefix`, in the backend's listing order.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the backend cannot be reached.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Open `key` for streaming.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the key is absent and `Transport` for any
    /// other backend failure.
    fn get_reader(&self, key: &str) -> Result<ObjectReader>;

    /// Upload `size` bytes read from `reader` under `key` as a private object.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the upload fails.
    fn put_reader(
        &self,
        key: &str,
        reader: ObjectReader,
        size: u64,
        content_type: &str,
    ) -> Result<()>;
}

// ── Extraction Port ───────────────────────────────────────────────────────────

/// Materializes an archive stream below a root directory.
pub trait ArchiveExtractor {
    /// Consume `stream` and write its entries below `root`.
    ///
    /// A failure leaves whatever was written so far in place.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat`, `UnsafeEntryPath` or `Io` depending on
    /// what went wrong.
    fn extract(&self, stream: ArchiveStream, root: &Path) -> Result<ExtractSummary>;
}

// ── Install Filesystem Port ───────────────────────────────────────────────────

/// Directory operations around extraction: preparing install targets and
/// swapping staged trees into place.
pub trait InstallFs {
    /// Create `path` and any missing parents, giving new directories `mode`.
    ///
    /// # Errors
    ///
    /// Returns `Io` on failure.
    fn create_dir_all(&self, path: &Path, mode: u32) -> Result<()>;

    /// Create a fresh, empty directory beside `target` to extract into.
    ///
    /// # Errors
    ///
    /// Returns `Io` on failure.
    fn create_staging_dir(&self, target: &Path) -> Result<PathBuf>;

    /// Move `staging` to `target`, replacing anything already there.
    ///
    /// # Errors
    ///
    /// Returns `Io` on failure.
    fn replace_dir(&self, staging: &Path, target: &Path) -> Result<()>;

    /// Best-effort removal of a directory tree.
    ///
    /// # Errors
    ///
    /// Returns `Io` on failure.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Loads the daybook configuration.
pub trait ConfigStore {
    /// Load, fill from the environment, and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting configuration is invalid.
    fn load(&self) -> anyhow::Result<DaybookConfig>;

    /// Location the configuration is read from.
    fn path(&self) -> &Path;
}

// ── Host Identity Port ────────────────────────────────────────────────────────

/// Source of the local host's name.
pub trait HostIdentity {
    /// # Errors
    ///
    /// Returns an error if no hostname source is available.
    fn hostname(&self) -> anyhow::Result<String>;
}

// ── Progress Reporter Port ────────────────────────────────────────────────────

/// Abstracts progress reporting so application services can emit progress
/// events without depending on the Presentation layer.
pub trait ProgressReporter {
    /// Report a step in progress.
    fn step(&self, message: &str);
    /// Report a completed step.
    fn success(&self, message: &str);
    /// Report a non-fatal problem.
    fn warn(&self, message: &str);
}
