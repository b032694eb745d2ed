//! Copy primitives. Sources are only ever read.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use ingestr_core::IngestError;

use crate::conflict::free_destination;

/// Create a folder and its parents; succeeds if it already exists.
pub fn ensure_folder(path: &Path) -> Result<(), IngestError> {
    fs::create_dir_all(path).map_err(|e| IngestError::create_folder(path, e))
}

/// Copy `source` to `dest`, refusing to replace an existing file.
///
/// Returns the number of bytes copied.
pub fn copy_file(source: &Path, dest: &Path) -> Result<u64, IngestError> {
    if dest.exists() {
        return Err(IngestError::DestinationExists {
            path: dest.to_path_buf(),
        });
    }

    let bytes = fs::copy(source, dest).map_err(|e| IngestError::copy(source, dest, e))?;
    debug!(from = %source.display(), to = %dest.display(), bytes, "copied");
    Ok(bytes)
}

/// Copy `source` into `folder` under its own file name.
///
/// Name clashes get a " (n)" suffix instead of failing. Returns the final
/// destination and the number of bytes copied.
pub fn copy_keeping_name(source: &Path, folder: &Path) -> Result<(PathBuf, u64), IngestError> {
    let name = source.file_name().ok_or_else(|| IngestError::Other {
        message: format!("Source has no file name: {}", source.display()),
    })?;
    let dest = free_destination(&folder.join(name));
    let bytes = copy_file(source, &dest)?;
    Ok((dest, bytes))
}
