//! Interval detection and sequence segmentation for ingestr.
//!
//! Both algorithms work on a file list already sorted by effective date:
//!
//! - **Interval detection** - The median gap between consecutive captures,
//!   ignoring zero gaps and gaps that are too large to be part of a burst
//! - **Segmentation** - Split the list wherever a gap exceeds a multiple of
//!   the normal interval, then tag undersized pieces as extras
//!
//! ```rust,ignore
//! use ingestr_analyze::{IntervalAnalyzer, Segmenter};
//! use ingestr_scan::{IngestConfig, SourceScanner};
//!
//! let config = IngestConfig::new("/Volumes/CARD/DCIM", "/Archive");
//! let files = SourceScanner::new().scan(&config).unwrap();
//!
//! let interval = IntervalAnalyzer::new().normal_interval(&files);
//! let sequences = Segmenter::new().segment(&files, interval);
//!
//! for seq in &sequences {
//!     println!("{}..{} ({:?})", seq.start, seq.end, seq.kind);
//! }
//! ```

pub mod interval;
mod segment;

pub use interval::{IntervalAnalyzer, IntervalConfig, IntervalConfigBuilder};
pub use segment::{SegmentConfig, SegmentConfigBuilder, Segmenter};

// Re-export core types
pub use ingestr_core::{Sequence, SequenceKind, SourceFile};
