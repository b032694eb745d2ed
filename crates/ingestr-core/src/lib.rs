//! Core types and configuration for ingestr.
//!
//! This crate provides the data model shared by every stage of an ingest:
//! source files with their resolved capture dates, sequences over the sorted
//! file list, the run configuration, and the error taxonomy.

mod config;
mod error;
mod sequence;
mod source;

pub use config::{BasenamePreset, IngestConfig, IngestConfigBuilder, NamingMode};
pub use error::IngestError;
pub use sequence::{Sequence, SequenceKind};
pub use source::{DateSource, SourceFile};
