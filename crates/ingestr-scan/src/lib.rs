//! Source enumeration and capture-date resolution for ingestr.
//!
//! This crate walks a source folder, keeps the files eligible for ingest and
//! resolves each one's effective capture date.
//!
//! # Overview
//!
//! - **Date resolution** via embedded EXIF, then file modification time,
//!   then the wall clock
//! - **Serial traversal** via jwalk with sorted directory entries, so the
//!   enumeration order (and tie order after the date sort) is reproducible
//! - **Eligibility** filtering: hidden entries and non-regular files are
//!   skipped, an optional extension filter is applied
//!
//! # Example
//!
//! ```rust,no_run
//! use ingestr_scan::{IngestConfig, SourceScanner};
//!
//! let config = IngestConfig::new("/Volumes/CARD/DCIM", "/Archive");
//! let files = SourceScanner::new().scan(&config).unwrap();
//!
//! for file in &files {
//!     println!("{} {}", file.effective_date, file.path.display());
//! }
//! ```

mod metadata;
mod scanner;

pub use metadata::{IMAGE_EXTENSIONS, MetadataResolver, parse_exif_datetime};
pub use scanner::SourceScanner;

// Re-export core types for convenience
pub use ingestr_core::{DateSource, IngestConfig, IngestError, SourceFile};
