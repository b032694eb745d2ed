//! Sequences over the date-sorted file list.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// How a sequence is handled during ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceKind {
    /// A shooting session that gets a basename and numbered files.
    Numbered,
    /// Too small to be a session; routed to the extras folder unnumbered.
    Extras,
}

/// A contiguous slice `[start, end)` of the sorted file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// Index of the first file.
    pub start: usize,
    /// Index one past the last file.
    pub end: usize,
    /// Numbered session or extras.
    pub kind: SequenceKind,
}

impl Sequence {
    /// Create a numbered sequence.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            kind: SequenceKind::Numbered,
        }
    }

    /// Number of files in the sequence.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the sequence holds no files.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if this sequence is routed to extras.
    pub fn is_extras(&self) -> bool {
        self.kind == SequenceKind::Extras
    }

    /// Index range into the sorted list.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}
