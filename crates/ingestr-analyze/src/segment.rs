//! Gap-based sequence segmentation.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ingestr_core::{IngestConfig, Sequence, SequenceKind, SourceFile};

/// Configuration for segmentation.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct SegmentConfig {
    /// A gap larger than `split_factor × normal interval` starts a new sequence.
    #[builder(default = "3")]
    pub split_factor: u32,

    /// Sequences with fewer files are tagged as extras.
    #[builder(default = "10")]
    pub min_sequence_size: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            split_factor: 3,
            min_sequence_size: 10,
        }
    }
}

impl SegmentConfig {
    /// Create a new config builder.
    pub fn builder() -> SegmentConfigBuilder {
        SegmentConfigBuilder::default()
    }
}

impl From<&IngestConfig> for SegmentConfig {
    fn from(config: &IngestConfig) -> Self {
        Self {
            split_factor: config.split_factor,
            min_sequence_size: config.min_sequence_size,
        }
    }
}

/// Splits a date-sorted file list into sequences.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmentConfig,
}

impl Segmenter {
    /// Create a new segmenter with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new segmenter with custom config.
    pub fn with_config(config: SegmentConfig) -> Self {
        Self { config }
    }

    /// Split at abnormal gaps and tag undersized sequences as extras.
    ///
    /// Without a normal interval the whole list is one sequence. The result
    /// always partitions `0..files.len()` in order.
    pub fn segment(&self, files: &[SourceFile], normal_interval: Option<Duration>) -> Vec<Sequence> {
        let sequences = match normal_interval {
            Some(interval) => self.split(files, interval),
            None => self.whole(files.len()),
        };
        self.classify(sequences)
    }

    /// Treat the whole list as a single sequence, then tag it.
    pub fn unsplit(&self, len: usize) -> Vec<Sequence> {
        self.classify(self.whole(len))
    }

    /// Break points: index 0 plus every index whose gap to its predecessor
    /// exceeds the split threshold.
    fn split(&self, files: &[SourceFile], interval: Duration) -> Vec<Sequence> {
        if files.is_empty() {
            return Vec::new();
        }

        let threshold = interval * self.config.split_factor;
        let mut starts = vec![0];
        for i in 1..files.len() {
            let gap = files[i].interval_since(&files[i - 1]);
            if gap.to_std().is_ok_and(|gap| gap > threshold) {
                starts.push(i);
            }
        }

        let sequences: Vec<Sequence> = starts
            .iter()
            .enumerate()
            .map(|(n, &start)| {
                let end = starts.get(n + 1).copied().unwrap_or(files.len());
                Sequence::new(start, end)
            })
            .collect();

        debug!(
            threshold_ms = threshold.as_millis() as u64,
            sequences = sequences.len(),
            "split files at gaps"
        );
        sequences
    }

    fn whole(&self, len: usize) -> Vec<Sequence> {
        if len == 0 {
            Vec::new()
        } else {
            vec![Sequence::new(0, len)]
        }
    }

    fn classify(&self, sequences: Vec<Sequence>) -> Vec<Sequence> {
        sequences
            .into_iter()
            .map(|seq| {
                if seq.len() < self.config.min_sequence_size {
                    Sequence {
                        kind: SequenceKind::Extras,
                        ..seq
                    }
                } else {
                    seq
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use ingestr_core::DateSource;

    fn files_at(offsets_secs: &[i64]) -> Vec<SourceFile> {
        let base = NaiveDate::from_ymd_opt(2007, 4, 16)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        offsets_secs
            .iter()
            .enumerate()
            .map(|(i, secs)| {
                SourceFile::new(
                    format!("/shoot/{i}.jpg"),
                    base + TimeDelta::seconds(*secs),
                    DateSource::Metadata,
                    0,
                )
            })
            .collect()
    }

    fn lenient() -> Segmenter {
        Segmenter::with_config(
            SegmentConfig::builder()
                .min_sequence_size(1usize)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_empty_input() {
        assert!(Segmenter::new().segment(&[], Some(Duration::from_secs(60))).is_empty());
        assert!(Segmenter::new().segment(&[], None).is_empty());
        assert!(Segmenter::new().unsplit(0).is_empty());
    }

    #[test]
    fn test_no_interval_is_one_sequence() {
        let files = files_at(&[0, 10, 5000]);
        let sequences = lenient().segment(&files, None);
        assert_eq!(sequences, vec![Sequence::new(0, 3)]);
    }

    #[test]
    fn test_split_threshold_is_strict() {
        // Interval 10s, threshold 30s: a 30s gap stays, a 31s gap splits.
        let files = files_at(&[0, 10, 40, 71, 81]);
        let sequences = lenient().segment(&files, Some(Duration::from_secs(10)));
        assert_eq!(sequences, vec![Sequence::new(0, 3), Sequence::new(3, 5)]);
    }

    #[test]
    fn test_small_sequences_become_extras() {
        let mut offsets: Vec<i64> = (0..12).map(|i| i * 60).collect();
        offsets.extend([7200 + 660, 7260 + 660]);
        let files = files_at(&offsets);

        let sequences = Segmenter::new().segment(&files, Some(Duration::from_secs(60)));
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].range(), 0..12);
        assert_eq!(sequences[0].kind, SequenceKind::Numbered);
        assert_eq!(sequences[1].range(), 12..14);
        assert_eq!(sequences[1].kind, SequenceKind::Extras);
    }

    #[test]
    fn test_unsplit_tags_small_run() {
        let sequences = Segmenter::new().unsplit(4);
        assert_eq!(sequences.len(), 1);
        assert!(sequences[0].is_extras());
    }
}
