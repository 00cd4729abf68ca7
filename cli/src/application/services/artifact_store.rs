//! Versioned artifact store service.
//!
//! Artifacts live in the object store as `"{name}-{version}.{extension}"`.
//! Imports only from `crate::application::ports` and `daybook_common`.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use daybook_common::{
    ArtifactFormats, DaybookError, Result, Service, artifact_key, validate_service,
};
use tracing::debug;

use crate::application::ports::{ArchiveStream, ObjectStore};

/// Artifact naming and retrieval over an object store.
pub struct ArtifactStore<O> {
    objects: O,
    formats: ArtifactFormats,
}

impl<O: ObjectStore> ArtifactStore<O> {
    pub fn new(objects: O, formats: ArtifactFormats) -> Self {
        Self { objects, formats }
    }

    /// Versions stored for `name`, in listing order, each listed once.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the store cannot be listed.
    pub fn list_versions(&self, name: &str) -> Result<Vec<Service>> {
        let separator = format!("{name}-");
        let mut seen = HashSet::new();
        let versions = self
            .objects
            .list(name)?
            .into_iter()
            .filter_map(|key| {
                let (stem, _) = self.formats.strip_suffix(&key)?;
                let version = stem.strip_prefix(separator.as_str())?;
                (!version.is_empty()).then(|| version.to_string())
            })
            .filter(|version| seen.insert(version.clone()))
            .map(|version| Service::versioned(name, version))
            .collect::<Vec<_>>();
        debug!(service = name, count = versions.len(), "listed versions");
        Ok(versions)
    }

    /// Open the artifact for a versioned service.
    ///
    /// Formats are tried in table order and the first present one wins.
    ///
    /// # Errors
    ///
    /// Returns `InvalidService` for an unversioned service, `NotFound` when
    /// no format is present, and the first non-`NotFound` error otherwise.
    pub fn fetch(&self, service: &Service) -> Result<ArchiveStream> {
        let Some(version) = service.version() else {
            return Err(DaybookError::InvalidService(format!(
                "'{}' has no version to fetch",
                service.name
            )));
        };
        for format in self.formats.iter() {
            let key = artifact_key(&service.name, version, &format.extension);
            match self.objects.get_reader(&key) {
                Ok(reader) => {
                    debug!(%key, "artifact opened");
                    return Ok(ArchiveStream::new(key, format.clone(), reader));
                }
                Err(err) if err.is_not_found() => {
                    debug!(%key, "artifact absent, trying next format");
                }
                Err(err) => return Err(err),
            }
        }
        Err(DaybookError::not_found(format!("artifact {service}")))
    }

    /// Upload a local archive as the artifact for a versioned service.
    ///
    /// Returns the object key written.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` for an unrecognized file suffix,
    /// `InvalidService` for a bad or missing version, `Io` if the file cannot
    /// be read, and `Transport` if the upload fails.
    pub fn store(&self, service: &Service, local_path: &Path) -> Result<String> {
        let format = self.formats.for_path(local_path).ok_or_else(|| {
            DaybookError::UnsupportedFormat(format!(
                "{} (expected one of: {})",
                local_path.display(),
                self.formats.extensions().join(", ")
            ))
        })?;
        validate_service(service)?;
        let Some(version) = service.version() else {
            return Err(DaybookError::InvalidService(format!(
                "'{}' has no version to store",
                service.name
            )));
        };

        let file = File::open(local_path)
            .map_err(|e| DaybookError::io(format!("opening {}", local_path.display()), e))?;
        let size = file
            .metadata()
            .map_err(|e| DaybookError::io(format!("reading size of {}", local_path.display()), e))?
            .len();

        let key = artifact_key(&service.name, version, &format.extension);
        self.objects.put_reader(&key, Box::new(file), size, &format.content_type)?;
        debug!(%key, size, "artifact stored");
        Ok(key)
    }
}
