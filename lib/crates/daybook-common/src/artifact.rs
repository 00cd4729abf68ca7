//! Artifact object naming: `"{name}-{version}.{extension}"`.
//!
//! The extension decides both the content type recorded at upload time and
//! how the stream is decompressed at extraction time. The content type is
//! metadata only and never consulted when reading.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Compression wrapped around the tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    Gzip,
}

/// One recognized artifact extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFormat {
    /// Extension without the leading dot, e.g. `tar.gz`.
    pub extension: String,
    pub content_type: String,
    pub compression: Compression,
}

impl ArtifactFormat {
    pub fn new(
        extension: impl Into<String>,
        content_type: impl Into<String>,
        compression: Compression,
    ) -> Self {
        Self {
            extension: extension.into(),
            content_type: content_type.into(),
            compression,
        }
    }

    fn suffix(&self) -> String {
        format!(".{}", self.extension)
    }
}

/// Build the object key for a service version under the given extension.
#[must_use]
pub fn artifact_key(name: &str, version: &str, extension: &str) -> String {
    format!("{name}-{version}.{extension}")
}

/// Ordered table of recognized formats.
///
/// Retrieval tries formats in table order, so the order decides which
/// object wins when the same version was stored under two extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFormats {
    formats: Vec<ArtifactFormat>,
}

impl Default for ArtifactFormats {
    fn default() -> Self {
        Self::new(vec![
            ArtifactFormat::new("tar.gz", "application/x-gtar", Compression::Gzip),
            ArtifactFormat::new("tar", "application/x-tar", Compression::None),
        ])
    }
}

impl ArtifactFormats {
    #[must_use]
    pub fn new(formats: Vec<ArtifactFormat>) -> Self {
        Self { formats }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArtifactFormat> {
        self.formats.iter()
    }

    /// Extensions in lookup order, for error messages.
    #[must_use]
    pub fn extensions(&self) -> Vec<&str> {
        self.formats.iter().map(|f| f.extension.as_str()).collect()
    }

    /// Format of a local file, judged by its file name suffix.
    ///
    /// The longest matching extension wins so `app.tar.gz` is never taken
    /// for a plain `tar` when both are recognized.
    #[must_use]
    pub fn for_path(&self, path: &Path) -> Option<&ArtifactFormat> {
        let file_name = path.file_name()?.to_str()?;
        self.longest_suffix_match(file_name)
            .map(|(_, format)| format)
    }

    /// Split an object key into its stem and format.
    ///
    /// Returns `None` when the key carries no recognized suffix.
    #[must_use]
    pub fn strip_suffix<'k>(&self, key: &'k str) -> Option<(&'k str, &ArtifactFormat)> {
        self.longest_suffix_match(key)
    }

    fn longest_suffix_match<'k>(&self, name: &'k str) -> Option<(&'k str, &ArtifactFormat)> {
        self.formats
            .iter()
            .filter_map(|format| {
                name.strip_suffix(format.suffix().as_str())
                    .filter(|stem| !stem.is_empty())
                    .map(|stem| (stem, format))
            })
            .max_by_key(|(_, format)| format.extension.len())
    }
}
