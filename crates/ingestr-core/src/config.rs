//! Ingest run configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How destination file names are produced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum NamingMode {
    /// `<basename><padded number>.<ext>`, continuing existing archives.
    #[default]
    Sequential,
    /// `YYYY-MM-DD-HHmmss-mmm.<ext>` from the effective date.
    DateTime,
    /// A random alphanumeric name, unique within the run.
    Random,
}

/// Ready-made basenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum BasenamePreset {
    /// `<YYYYMMDD>1CO_`
    Timelapse,
    /// `<YYYYMMDD>_`
    DateSequence,
    /// `IMG_`
    Img,
    /// `Photo_`
    Photo,
    /// `Scan_`
    Scan,
}

impl BasenamePreset {
    /// Resolve the preset to a literal basename for the given day.
    pub fn resolve(&self, today: NaiveDate) -> String {
        let stamp = today.format("%Y%m%d");
        match self {
            Self::Timelapse => format!("{stamp}1CO_"),
            Self::DateSequence => format!("{stamp}_"),
            Self::Img => "IMG_".to_string(),
            Self::Photo => "Photo_".to_string(),
            Self::Scan => "Scan_".to_string(),
        }
    }

    /// Whether the preset embeds a date.
    pub fn is_dated(&self) -> bool {
        matches!(self, Self::Timelapse | Self::DateSequence)
    }
}

/// Configuration for one ingest run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct IngestConfig {
    /// Folder to ingest from (walked recursively).
    pub source: PathBuf,

    /// Archive root; files land in `<output>/<year>/...`.
    pub output: PathBuf,

    /// Only ingest files with this extension (case-insensitive). Empty = all.
    #[builder(default)]
    #[serde(default)]
    pub extension_filter: String,

    /// Naming policy for the run.
    #[builder(default)]
    #[serde(default)]
    pub mode: NamingMode,

    /// Literal basename for sequential naming.
    #[builder(default)]
    #[serde(default)]
    pub basename: String,

    /// Digit width of sequence numbers (1..=10).
    #[builder(default = "4")]
    #[serde(default = "default_padding")]
    pub number_padding: usize,

    /// First number of a fresh sequence (>= 1).
    #[builder(default = "1")]
    #[serde(default = "default_start_number")]
    pub start_number: u64,

    /// Derive `<YYYYMMDD><ordinal>CO_` basenames from each sequence's first file.
    #[builder(default = "false")]
    #[serde(default)]
    pub auto_rename: bool,

    /// Split the run into sequences at abnormal gaps (requires `auto_rename`).
    #[builder(default = "false")]
    #[serde(default)]
    pub auto_split: bool,

    /// Continue numbering after files already in the destination folder.
    #[builder(default = "false")]
    #[serde(default)]
    pub add_to_existing: bool,

    /// Length of generated random names.
    #[builder(default = "8")]
    #[serde(default = "default_random_name_length")]
    pub random_name_length: usize,

    /// Sequences smaller than this are routed to extras.
    #[builder(default = "10")]
    #[serde(default = "default_min_sequence_size")]
    pub min_sequence_size: usize,

    /// Minimum files needed to detect a normal interval.
    #[builder(default = "3")]
    #[serde(default = "default_min_interval_samples")]
    pub min_interval_samples: usize,

    /// Base gap; deltas at or beyond twice this value are ignored as noise.
    #[builder(default = "Duration::from_secs(60)")]
    #[serde(default = "default_gap_threshold")]
    pub gap_threshold: Duration,

    /// A gap larger than this multiple of the normal interval starts a new sequence.
    #[builder(default = "3")]
    #[serde(default = "default_split_factor")]
    pub split_factor: u32,

    /// Literal placed after the per-day ordinal in derived basenames.
    #[builder(default = "\"CO\".to_string()")]
    #[serde(default = "default_ordinal_suffix")]
    pub ordinal_suffix: String,

    /// Folder under the year directory that receives extras.
    #[builder(default = "\"Extras\".to_string()")]
    #[serde(default = "default_extras_folder")]
    pub extras_folder: String,
}

fn default_padding() -> usize {
    4
}

fn default_start_number() -> u64 {
    1
}

fn default_random_name_length() -> usize {
    8
}

fn default_min_sequence_size() -> usize {
    10
}

fn default_min_interval_samples() -> usize {
    3
}

fn default_gap_threshold() -> Duration {
    Duration::from_secs(60)
}

fn default_split_factor() -> u32 {
    3
}

fn default_ordinal_suffix() -> String {
    "CO".to_string()
}

fn default_extras_folder() -> String {
    "Extras".to_string()
}

impl IngestConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.source {
            Some(ref source) if source.as_os_str().is_empty() => {
                return Err("Source path cannot be empty".to_string());
            }
            None => return Err("Source path is required".to_string()),
            _ => {}
        }
        match self.output {
            Some(ref output) if output.as_os_str().is_empty() => {
                return Err("Output path cannot be empty".to_string());
            }
            None => return Err("Output path is required".to_string()),
            _ => {}
        }
        if let Some(padding) = self.number_padding
            && !(1..=10).contains(&padding)
        {
            return Err(format!("Number padding must be between 1 and 10, got {padding}"));
        }
        if self.start_number == Some(0) {
            return Err("Start number must be at least 1".to_string());
        }
        if self.random_name_length == Some(0) {
            return Err("Random name length must be at least 1".to_string());
        }
        if self.min_sequence_size == Some(0) {
            return Err("Minimum sequence size must be at least 1".to_string());
        }
        if self.split_factor == Some(0) {
            return Err("Split factor must be at least 1".to_string());
        }
        Ok(())
    }
}

impl IngestConfig {
    /// Create a new config builder.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Create a sequential config with defaults for everything but the paths.
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            extension_filter: String::new(),
            mode: NamingMode::Sequential,
            basename: String::new(),
            number_padding: default_padding(),
            start_number: default_start_number(),
            auto_rename: false,
            auto_split: false,
            add_to_existing: false,
            random_name_length: default_random_name_length(),
            min_sequence_size: default_min_sequence_size(),
            min_interval_samples: default_min_interval_samples(),
            gap_threshold: default_gap_threshold(),
            split_factor: default_split_factor(),
            ordinal_suffix: default_ordinal_suffix(),
            extras_folder: default_extras_folder(),
        }
    }

    /// Check a path against the extension filter.
    pub fn matches_extension(&self, path: &Path) -> bool {
        if self.extension_filter.is_empty() {
            return true;
        }
        let wanted = self.extension_filter.trim_start_matches('.');
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
    }

    /// Whether the run is split into sequences at abnormal gaps.
    pub fn splits_sequences(&self) -> bool {
        self.mode == NamingMode::Sequential && self.auto_rename && self.auto_split
    }
}
