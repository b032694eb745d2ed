//! Progress and completion types for ingest runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::Display;

use ingestr_core::IngestError;

/// Run state machine.
///
/// `Idle -> Enumerating -> Segmenting -> Copying -> Completed`, with
/// `Cancelled` and `Errored` reachable from any in-progress state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum IngestPhase {
    #[default]
    Idle,
    Enumerating,
    Segmenting,
    Copying,
    Completed,
    Cancelled,
    Errored,
}

impl IngestPhase {
    /// Check if the run has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Errored)
    }
}

/// Progress information for an ongoing run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestProgress {
    /// Files handled so far (numbered and extras).
    pub files_completed: usize,
    /// Eligible files in the run.
    pub files_total: usize,
    /// Bytes copied so far.
    pub bytes_copied: u64,
    /// Sequences handled so far.
    pub sequences_completed: usize,
    /// Sequences in the run.
    pub sequences_total: usize,
    /// Folder the last sequence was written to.
    pub current_folder: Option<PathBuf>,
}

impl IngestProgress {
    /// Create a new progress tracker.
    pub fn new(files_total: usize, sequences_total: usize) -> Self {
        Self {
            files_total,
            sequences_total,
            ..Default::default()
        }
    }

    /// Fraction of files handled, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.files_total == 0 {
            return 0.0;
        }
        (self.files_completed as f64 / self.files_total as f64).min(1.0)
    }

    /// Record one copied file.
    pub fn complete_file(&mut self, bytes: u64) {
        self.files_completed += 1;
        self.bytes_copied += bytes;
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestComplete {
    /// Folder to show the user: the year folder, or its extras folder.
    pub folder: PathBuf,
    /// Whether any sequence was routed to extras.
    pub has_extras: bool,
    /// Year of the earliest file.
    pub year: i32,
    /// Files copied under generated names.
    pub files_renamed: usize,
    /// Files copied into extras.
    pub extras_copied: usize,
    /// Total bytes copied.
    pub bytes_copied: u64,
    /// Sequences processed (numbered and extras).
    pub sequences: usize,
}

impl IngestComplete {
    /// Human-readable completion message.
    pub fn message(&self) -> String {
        if self.has_extras {
            "Extra files were found not matching any sequence. Check the Extras folder.".to_string()
        } else {
            format!("Ingest has completed successfully to the {} folder", self.year)
        }
    }

    /// Total files copied.
    pub fn files_copied(&self) -> usize {
        self.files_renamed + self.extras_copied
    }
}

/// How a run ended without a fatal error.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// No eligible files; nothing was created.
    Empty,
    /// Every sequence was processed.
    Completed(IngestComplete),
    /// Stopped at a sequence boundary; earlier copies are kept.
    Cancelled(IngestProgress),
}

/// Event delivered to the observer of a run.
#[derive(Debug)]
pub enum IngestEvent {
    /// State machine transition.
    Phase(IngestPhase),
    /// Emitted after each sequence.
    Progress(IngestProgress),
    /// The run finished.
    Complete(IngestComplete),
    /// The source held no eligible files.
    Empty,
    /// The run was cancelled.
    Cancelled(IngestProgress),
    /// The run aborted.
    Failed(IngestError),
}

impl IngestEvent {
    /// Check if this is the last event of a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Complete(_) | Self::Empty | Self::Cancelled(_) | Self::Failed(_)
        )
    }
}

impl From<Result<IngestOutcome, IngestError>> for IngestEvent {
    fn from(result: Result<IngestOutcome, IngestError>) -> Self {
        match result {
            Ok(IngestOutcome::Empty) => Self::Empty,
            Ok(IngestOutcome::Completed(complete)) => Self::Complete(complete),
            Ok(IngestOutcome::Cancelled(progress)) => Self::Cancelled(progress),
            Err(err) => Self::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        let mut progress = IngestProgress::new(4, 1);
        assert_eq!(progress.fraction(), 0.0);
        progress.complete_file(10);
        progress.complete_file(10);
        assert_eq!(progress.fraction(), 0.5);
        assert_eq!(progress.bytes_copied, 20);

        assert_eq!(IngestProgress::new(0, 0).fraction(), 0.0);
    }

    #[test]
    fn test_completion_message() {
        let mut complete = IngestComplete {
            folder: PathBuf::from("/archive/2007"),
            has_extras: false,
            year: 2007,
            files_renamed: 12,
            extras_copied: 0,
            bytes_copied: 0,
            sequences: 1,
        };
        assert_eq!(
            complete.message(),
            "Ingest has completed successfully to the 2007 folder"
        );

        complete.has_extras = true;
        assert!(complete.message().contains("Extras"));
    }

    #[test]
    fn test_terminal_events() {
        assert!(IngestEvent::Empty.is_terminal());
        assert!(!IngestEvent::Phase(IngestPhase::Copying).is_terminal());
        assert!(IngestPhase::Errored.is_terminal());
        assert!(!IngestPhase::Segmenting.is_terminal());
    }
}
