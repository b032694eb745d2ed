//! JWalk-based source enumeration.

use std::path::Path;
use std::time::Instant;

use jwalk::{Parallelism, WalkDir};
use tracing::{info, warn};

use ingestr_core::{IngestConfig, IngestError, SourceFile};

use crate::metadata::MetadataResolver;

/// Enumerates eligible files and resolves their effective dates.
#[derive(Debug, Clone, Default)]
pub struct SourceScanner {
    resolver: MetadataResolver,
}

impl SourceScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scanner with a specific resolver.
    pub fn with_resolver(resolver: MetadataResolver) -> Self {
        Self { resolver }
    }

    /// Walk the source folder and return eligible files sorted by effective date.
    ///
    /// Files sharing a date keep their enumeration order. Only a failure to
    /// read the root itself is an error; unreadable entries below it are
    /// skipped.
    pub fn scan(&self, config: &IngestConfig) -> Result<Vec<SourceFile>, IngestError> {
        let start = Instant::now();
        let root_path = config
            .source
            .canonicalize()
            .map_err(|e| IngestError::io(&config.source, e))?;

        if !root_path.is_dir() {
            return Err(IngestError::NotADirectory { path: root_path });
        }

        // jwalk reports an unreadable root as an ordinary entry error.
        std::fs::read_dir(&root_path).map_err(|e| IngestError::io(&root_path, e))?;

        let mut files = self.collect_files(config, &root_path);
        files.sort_by_key(|file| file.effective_date);

        info!(
            root = %root_path.display(),
            files = files.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "enumerated source files"
        );

        Ok(files)
    }

    /// Collect eligible files in enumeration order.
    fn collect_files(&self, config: &IngestConfig, root_path: &Path) -> Vec<SourceFile> {
        let walker = WalkDir::new(root_path)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(true)
            .follow_links(false)
            .min_depth(1);

        let mut files = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    warn!(path = %path.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !config.matches_extension(&path) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => Some(m),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "could not read metadata");
                    None
                }
            };

            let (effective_date, date_source) = self.resolver.resolve_with(&path, metadata.as_ref());
            let size = metadata.as_ref().map(|m| m.len()).unwrap_or(0);

            files.push(SourceFile::new(path, effective_date, date_source, size));
        }

        files
    }
}
