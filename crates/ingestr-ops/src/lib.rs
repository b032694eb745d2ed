//! Naming, copying and run orchestration for ingestr.
//!
//! [`IngestPipeline`] drives a run synchronously and reports through a
//! callback; [`start_ingest`] runs it on a blocking worker and streams
//! [`IngestEvent`]s over a channel, the same way the scanner and analyzer
//! are driven from the CLI.

mod conflict;
mod copy;
pub mod naming;
mod pipeline;
mod progress;

pub use conflict::free_destination;
pub use copy::{copy_file, copy_keeping_name, ensure_folder};
pub use naming::{LastSequenceNumber, NamingContext, RandomNameRegistry};
pub use pipeline::{IngestPipeline, start_ingest};
pub use progress::{IngestComplete, IngestEvent, IngestOutcome, IngestPhase, IngestProgress};

pub use ingestr_core::{IngestConfig, IngestError, NamingMode};

/// Default channel buffer size for ingest events.
pub const INGEST_CHANNEL_SIZE: usize = 100;
