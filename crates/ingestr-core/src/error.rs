//! Error types for ingest runs.

use std::path::PathBuf;

use thiserror::Error;

/// Run-level failures.
///
/// Per-file problems (unreadable metadata, ineligible entries) never surface
/// here; they are absorbed where they occur. Anything in this enum aborts the
/// remainder of the run and leaves already copied files in place.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source root is not a directory.
    #[error("Source path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A destination folder could not be created.
    #[error("Failed to create folder {path}: {source}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying a file into the archive failed.
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The computed destination name is already taken.
    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl IngestError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a folder creation error.
    pub fn create_folder(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateFolder {
            path: path.into(),
            source,
        }
    }

    /// Create a copy error.
    pub fn copy(from: impl Into<PathBuf>, to: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Copy {
            from: from.into(),
            to: to.into(),
            source,
        }
    }
}
