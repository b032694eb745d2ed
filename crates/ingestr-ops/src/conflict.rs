//! Collision handling for unnumbered destinations.

use std::path::{Path, PathBuf};

/// First free variant of `path`, trying the path itself and then
/// "name (1).ext", "name (2).ext", etc.
pub fn free_destination(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let parent = path.parent().unwrap_or(Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().to_string());

    (1u64..)
        .map(|i| {
            let name = match &extension {
                Some(ext) => format!("{stem} ({i}).{ext}"),
                None => format!("{stem} ({i})"),
            };
            parent.join(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
