//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain` and `daybook_common`, never
//! on `crate::infra`, `crate::commands`, or `crate::output`.

pub mod ports;
pub mod services;

pub use ports::{
    ArchiveExtractor, ArchiveStream, ConfigStore, ExtractSummary, HostIdentity, InstallFs, KvEntry,
    KvStore, ObjectReader, ObjectStore, ProgressReporter,
};
