//! Filesystem infrastructure: implements `InstallFs` and file hashing.

use std::fs::{DirBuilder, Permissions};
use std::io::{self, Read};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use daybook_common::DaybookError;
use sha2::{Digest, Sha256};

use crate::application::ports::InstallFs;
use crate::application::services::pull::INSTALL_DIR_MODE;

/// Production filesystem implementation of `InstallFs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl InstallFs for LocalFs {
    fn create_dir_all(&self, path: &Path, mode: u32) -> daybook_common::Result<()> {
        DirBuilder::new()
            .recursive(true)
            .mode(mode)
            .create(path)
            .map_err(|e| DaybookError::io(format!("creating directory {}", path.display()), e))
    }

    fn create_staging_dir(&self, target: &Path) -> daybook_common::Result<PathBuf> {
        let parent = target.parent().unwrap_or_else(|| Path::new("."));
        let name = target
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        let staging = tempfile::Builder::new()
            .prefix(&format!(".{name}.staging-"))
            .tempdir_in(parent)
            .map_err(|e| DaybookError::io(format!("creating staging directory in {}", parent.display()), e))?
            .keep();
        std::fs::set_permissions(&staging, Permissions::from_mode(INSTALL_DIR_MODE))
            .map_err(|e| DaybookError::io(format!("setting mode on {}", staging.display()), e))?;
        Ok(staging)
    }

    fn replace_dir(&self, staging: &Path, target: &Path) -> daybook_common::Result<()> {
        match std::fs::remove_dir_all(target) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DaybookError::io(format!("removing {}", target.display()), e));
            }
        }
        std::fs::rename(staging, target).map_err(|e| {
            DaybookError::io(
                format!("moving {} to {}", staging.display(), target.display()),
                e,
            )
        })
    }

    fn remove_dir_all(&self, path: &Path) -> daybook_common::Result<()> {
        std::fs::remove_dir_all(path)
            .map_err(|e| DaybookError::io(format!("removing directory {}", path.display()), e))
    }
}

/// Compute the SHA256 hex digest of a file.
///
/// Reads the file in 64 KB chunks to avoid loading large files into memory.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
