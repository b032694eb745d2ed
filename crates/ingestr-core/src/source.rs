//! Source file type.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime, TimeDelta};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Where a file's effective date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum DateSource {
    /// Embedded capture metadata (EXIF).
    Metadata,
    /// Filesystem content-modification time.
    Modified,
    /// Wall clock at resolution time.
    Now,
}

/// A file eligible for ingest.
///
/// The effective date is zone-less wall-clock time and is fixed once the
/// file has been resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Extension as it appears on disk (no leading dot, may be empty).
    pub extension: CompactString,
    /// Best-available capture timestamp.
    pub effective_date: NaiveDateTime,
    /// Which step of the fallback chain produced the date.
    pub date_source: DateSource,
    /// Size in bytes.
    pub size: u64,
}

impl SourceFile {
    /// Create a source file.
    pub fn new(
        path: impl Into<PathBuf>,
        effective_date: NaiveDateTime,
        date_source: DateSource,
        size: u64,
    ) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .map(|e| CompactString::new(e.to_string_lossy()))
            .unwrap_or_default();
        Self {
            path,
            extension,
            effective_date,
            date_source,
            size,
        }
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component, lossily converted.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Calendar year of the effective date.
    pub fn year(&self) -> i32 {
        self.effective_date.year()
    }

    /// Signed time elapsed between `earlier` and this file.
    pub fn interval_since(&self, earlier: &SourceFile) -> TimeDelta {
        self.effective_date - earlier.effective_date
    }
}
