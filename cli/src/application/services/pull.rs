//! The pull use-case.
//!
//! Resolves the host's services, then fetches and extracts every stored
//! version of each into `{install_dir}/{name}/{version}`. The first failure
//! aborts the pull.

use std::path::{Path, PathBuf};

use daybook_common::{Result, Service, validate_service};
use serde::Serialize;
use tracing::{info, warn};

use crate::application::ports::{
    ArchiveExtractor, ArchiveStream, ExtractSummary, InstallFs, KvStore, ObjectStore,
    ProgressReporter,
};
use crate::application::services::{ArtifactStore, PatternRegistry};

/// Mode given to install directories created by a pull.
pub const INSTALL_DIR_MODE: u32 = 0o755;

pub struct PullOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    pub install_dir: &'a Path,
    /// Extract into a sibling staging directory and swap it in on success.
    pub staged: bool,
}

/// One artifact placed on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PulledArtifact {
    pub service: String,
    pub version: String,
    pub path: PathBuf,
    pub files: u64,
    pub directories: u64,
}

/// Outcome of the `pull_host` use-case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullSummary {
    pub host: String,
    pub services: Vec<String>,
    pub artifacts: Vec<PulledArtifact>,
}

impl PullSummary {
    /// Files and directories written across every artifact.
    #[must_use]
    pub fn totals(&self) -> ExtractSummary {
        let mut totals = ExtractSummary::default();
        for artifact in &self.artifacts {
            totals += ExtractSummary {
                files: artifact.files,
                directories: artifact.directories,
            };
        }
        totals
    }
}

/// Install every artifact version of every service mapped to `host`.
///
/// # Errors
///
/// Returns the first registry, store, filesystem or extraction error.
pub fn pull_host<K: KvStore, O: ObjectStore>(
    registry: &PatternRegistry<K>,
    store: &ArtifactStore<O>,
    extractor: &impl ArchiveExtractor,
    fs: &impl InstallFs,
    host: &str,
    opts: &PullOptions<'_, impl ProgressReporter>,
) -> Result<PullSummary> {
    let reporter = opts.reporter;
    let services = registry.resolve_services_for_host(host)?;
    let mut summary = PullSummary {
        host: host.to_string(),
        services: services.iter().map(|s| s.name.clone()).collect(),
        artifacts: Vec::new(),
    };
    if services.is_empty() {
        reporter.warn(&format!("No services mapped to host {host}"));
        return Ok(summary);
    }

    for service in &services {
        validate_service(service)?;
        let versions = store.list_versions(&service.name)?;
        if versions.is_empty() {
            reporter.warn(&format!("No artifacts stored for {}", service.name));
            continue;
        }
        for versioned in versions {
            validate_service(&versioned)?;
            reporter.step(&format!("Pulling {versioned}..."));
            let stream = store.fetch(&versioned)?;
            let artifact = install(extractor, fs, stream, &versioned, opts)?;
            info!(
                service = %versioned,
                path = %artifact.path.display(),
                files = artifact.files,
                "artifact installed"
            );
            reporter.success(&format!(
                "Installed {versioned} ({} files)",
                artifact.files
            ));
            summary.artifacts.push(artifact);
        }
    }
    Ok(summary)
}

fn install(
    extractor: &impl ArchiveExtractor,
    fs: &impl InstallFs,
    stream: ArchiveStream,
    service: &Service,
    opts: &PullOptions<'_, impl ProgressReporter>,
) -> Result<PulledArtifact> {
    let version = service.version().unwrap_or_default();
    let service_dir = opts.install_dir.join(&service.name);
    let target = service_dir.join(version);

    let extracted = if opts.staged {
        fs.create_dir_all(&service_dir, INSTALL_DIR_MODE)?;
        let staging = fs.create_staging_dir(&target)?;
        match extractor.extract(stream, &staging) {
            Ok(extracted) => {
                fs.replace_dir(&staging, &target)?;
                extracted
            }
            Err(err) => {
                if let Err(cleanup) = fs.remove_dir_all(&staging) {
                    warn!(path = %staging.display(), error = %cleanup, "failed to remove staging directory");
                }
                return Err(err);
            }
        }
    } else {
        fs.create_dir_all(&target, INSTALL_DIR_MODE)?;
        extractor.extract(stream, &target)?
    };

    Ok(PulledArtifact {
        service: service.name.clone(),
        version: version.to_string(),
        path: target,
        files: extracted.files,
        directories: extracted.directories,
    })
}
