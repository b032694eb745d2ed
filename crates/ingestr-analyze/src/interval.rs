//! Normal capture interval detection.
//!
//! The normal interval is the baseline a gap is compared against when
//! deciding whether a new shooting session started. It is the median of the
//! consecutive deltas that look like regular shooting cadence:
//! - zero and negative deltas (burst shots, clock ties) are dropped
//! - deltas of twice the gap threshold or more are dropped as session breaks

use std::time::Duration;

use derive_builder::Builder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ingestr_core::{IngestConfig, SourceFile};

/// Configuration for interval detection.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct IntervalConfig {
    /// Fewer files than this and the interval is undetectable.
    #[builder(default = "3")]
    pub min_samples: usize,

    /// Deltas at or above twice this value are ignored.
    #[builder(default = "Duration::from_secs(60)")]
    pub gap_threshold: Duration,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            min_samples: 3,
            gap_threshold: Duration::from_secs(60),
        }
    }
}

impl IntervalConfig {
    /// Create a new config builder.
    pub fn builder() -> IntervalConfigBuilder {
        IntervalConfigBuilder::default()
    }

    /// Upper bound (exclusive) for a delta to count as regular cadence.
    pub fn ceiling(&self) -> Duration {
        self.gap_threshold * 2
    }
}

impl From<&IngestConfig> for IntervalConfig {
    fn from(config: &IngestConfig) -> Self {
        Self {
            min_samples: config.min_interval_samples,
            gap_threshold: config.gap_threshold,
        }
    }
}

/// Detects the normal capture interval of a date-sorted file list.
#[derive(Debug, Clone, Default)]
pub struct IntervalAnalyzer {
    config: IntervalConfig,
}

impl IntervalAnalyzer {
    /// Create a new analyzer with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new analyzer with custom config.
    pub fn with_config(config: IntervalConfig) -> Self {
        Self { config }
    }

    /// Median regular delta between consecutive files, if detectable.
    ///
    /// Even-length delta lists resolve to the lower of the two middle values.
    /// Returns `None` for too few files or when every delta was filtered out.
    pub fn normal_interval(&self, files: &[SourceFile]) -> Option<Duration> {
        if files.len() < self.config.min_samples {
            return None;
        }

        let ceiling = self.config.ceiling();
        let deltas: Vec<Duration> = files
            .iter()
            .tuple_windows()
            .filter_map(|(prev, next)| next.interval_since(prev).to_std().ok())
            .filter(|delta| !delta.is_zero() && *delta < ceiling)
            .sorted()
            .collect();

        let median = lower_median(&deltas);
        debug!(
            samples = deltas.len(),
            interval_ms = median.map(|d| d.as_millis() as u64),
            "detected normal interval"
        );
        median
    }
}

/// Lower-middle element of a sorted slice.
fn lower_median(sorted: &[Duration]) -> Option<Duration> {
    if sorted.is_empty() {
        return None;
    }
    Some(sorted[(sorted.len() - 1) / 2])
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

    #[test]
    fn test_too_few_files() {
        let analyzer = IntervalAnalyzer::new();
        assert_eq!(analyzer.normal_interval(&files_at(&[0, 10])), None);
        assert_eq!(analyzer.normal_interval(&[]), None);
    }

    #[test]
    fn test_regular_cadence() {
        let analyzer = IntervalAnalyzer::new();
        let files = files_at(&[0, 5, 10, 15, 20]);
        assert_eq!(analyzer.normal_interval(&files), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_even_count_takes_lower_middle() {
        let analyzer = IntervalAnalyzer::new();
        // Deltas: 10, 20, 30, 40
        let files = files_at(&[0, 10, 30, 60, 100]);
        assert_eq!(analyzer.normal_interval(&files), Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_outliers_ignored() {
        let analyzer = IntervalAnalyzer::new();
        // Deltas: 0 (tie), 5, 7, 120 (at ceiling), 3600
        let files = files_at(&[0, 0, 5, 12, 132, 3732]);
        assert_eq!(analyzer.normal_interval(&files), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_all_deltas_filtered() {
        let analyzer = IntervalAnalyzer::new();
        assert_eq!(analyzer.normal_interval(&files_at(&[0, 0, 0, 0])), None);
        assert_eq!(analyzer.normal_interval(&files_at(&[0, 500, 1000])), None);
    }

    #[test]
    fn test_custom_config() {
        let config = IntervalConfig::builder()
            .min_samples(2usize)
            .gap_threshold(Duration::from_secs(300))
            .build()
            .unwrap();
        let analyzer = IntervalAnalyzer::with_config(config);
        assert_eq!(
            analyzer.normal_interval(&files_at(&[0, 500])),
            Some(Duration::from_secs(500))
        );
    }
}
