//! Tar extraction: implements the `ArchiveExtractor` port.
//!
//! Entries are written one by one straight from the stream, so a failure
//! leaves a partial tree behind. File and directory modes are masked to
//! `0o777` and ownership is copied from the headers.

use std::fs::{DirBuilder, File, Permissions};
use std::io::{self, Read};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Component, Path, PathBuf};

use daybook_common::{Compression, DaybookError, Result};
use flate2::read::MultiGzDecoder;
use tar::{Archive, Entry, EntryType};
use tracing::{debug, trace};

use crate::application::ports::{ArchiveExtractor, ArchiveStream, ExtractSummary};

/// Permission bits kept from entry headers.
const MODE_MASK: u32 = 0o777;

/// Extraction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Place directory entries at `root/<basename>` instead of their full
    /// relative path.
    pub flatten_directories: bool,
}

/// Production `ArchiveExtractor` for tar and gzip-compressed tar streams.
#[derive(Debug, Clone, Default)]
pub struct TarArchiveExtractor {
    options: ExtractOptions,
}

impl TarArchiveExtractor {
    #[must_use]
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }
}

impl ArchiveExtractor for TarArchiveExtractor {
    fn extract(&self, stream: ArchiveStream, root: &Path) -> Result<ExtractSummary> {
        let key = stream.key().to_string();
        let compression = stream.format().compression;
        let reader = stream.into_reader();
        let decoded: Box<dyn Read> = match compression {
            // pigz and `cat a.gz b.gz` produce several members in one stream.
            Compression::Gzip => Box::new(MultiGzDecoder::new(reader)),
            Compression::None => reader,
        };
        debug!(%key, root = %root.display(), "extracting");

        let mut archive = Archive::new(decoded);
        let entries = archive
            .entries()
            .map_err(|e| DaybookError::io(format!("reading archive {key}"), e))?;

        let mut summary = ExtractSummary::default();
        for entry in entries {
            let mut entry =
                entry.map_err(|e| DaybookError::io(format!("reading archive {key}"), e))?;
            let entry_type = entry.header().entry_type();
            let name = entry_name(&entry);
            match entry_type {
                EntryType::Regular => {
                    write_file(&mut entry, &name, root)?;
                    summary.files += 1;
                }
                EntryType::Directory => {
                    self.write_directory(&entry, &name, root)?;
                    summary.directories += 1;
                }
                EntryType::XGlobalHeader
                | EntryType::XHeader
                | EntryType::GNULongName
                | EntryType::GNULongLink => {
                    trace!(entry = %name, "skipping metadata header");
                }
                other => {
                    return Err(DaybookError::UnsupportedFormat(format!(
                        "entry '{name}' has type {other:?}"
                    )));
                }
            }
        }
        debug!(%key, files = summary.files, directories = summary.directories, "extracted");
        Ok(summary)
    }
}

impl TarArchiveExtractor {
    fn write_directory<R: Read>(&self, entry: &Entry<'_, R>, name: &str, root: &Path) -> Result<()> {
        let relative = safe_relative_path(name)?;
        let target = if self.options.flatten_directories {
            relative
                .file_name()
                .map_or_else(|| root.to_path_buf(), |base| root.join(base))
        } else {
            root.join(&relative)
        };
        let (mode, uid, gid) = header_attrs(entry, name)?;
        trace!(path = %target.display(), mode, "writing directory");

        if !target.is_dir() {
            DirBuilder::new()
                .mode(mode)
                .create(&target)
                .map_err(|e| DaybookError::io(format!("creating {}", target.display()), e))?;
        }
        apply_attrs(&target, mode, uid, gid)
    }
}

/// The parent directory must already exist; archives list directories first.
fn write_file<R: Read>(entry: &mut Entry<'_, R>, name: &str, root: &Path) -> Result<()> {
    let relative = safe_relative_path(name)?;
    let target = root.join(&relative);
    let (mode, uid, gid) = header_attrs(entry, name)?;
    trace!(path = %target.display(), mode, "writing file");

    let mut file = File::create(&target)
        .map_err(|e| DaybookError::io(format!("creating {}", target.display()), e))?;
    io::copy(entry, &mut file)
        .map_err(|e| DaybookError::io(format!("writing {}", target.display()), e))?;
    drop(file);

    apply_attrs(&target, mode, uid, gid)
}

fn entry_name<R: Read>(entry: &Entry<'_, R>) -> String {
    entry.path().map_or_else(
        |_| String::from_utf8_lossy(&entry.path_bytes()).into_owned(),
        |p| p.to_string_lossy().into_owned(),
    )
}

/// Reject absolute paths and anything that climbs with `..`.
fn safe_relative_path(name: &str) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(DaybookError::UnsafeEntryPath(name.to_string()));
            }
        }
    }
    Ok(relative)
}

fn header_attrs<R: Read>(entry: &Entry<'_, R>, name: &str) -> Result<(u32, u32, u32)> {
    let header = entry.header();
    let bad_header = |e: io::Error| DaybookError::io(format!("reading header of '{name}'"), e);
    let mode = header.mode().map_err(bad_header)? & MODE_MASK;
    let uid = id_from_header(header.uid().map_err(bad_header)?, name)?;
    let gid = id_from_header(header.gid().map_err(bad_header)?, name)?;
    Ok((mode, uid, gid))
}

fn id_from_header(id: u64, name: &str) -> Result<u32> {
    u32::try_from(id).map_err(|_| {
        DaybookError::io(
            format!("owner id {id} of '{name}' is out of range"),
            io::Error::from(io::ErrorKind::InvalidData),
        )
    })
}

fn apply_attrs(path: &Path, mode: u32, uid: u32, gid: u32) -> Result<()> {
    std::fs::set_permissions(path, Permissions::from_mode(mode))
        .map_err(|e| DaybookError::io(format!("setting mode {mode:o} on {}", path.display()), e))?;
    std::os::unix::fs::chown(path, Some(uid), Some(gid))
        .map_err(|e| DaybookError::io(format!("setting owner {uid}:{gid} on {}", path.display()), e))
}
