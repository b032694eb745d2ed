use chrono::NaiveDate;
use ingestr_core::{
    DateSource, IngestConfig, IngestError, NamingMode, Sequence, SequenceKind, SourceFile,
};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_source_file_year_boundary() {
    let new_year = NaiveDate::from_ymd_opt(2008, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 1)
        .unwrap();
    let eve = NaiveDate::from_ymd_opt(2007, 12, 31)
        .unwrap()
        .and_hms_opt(23, 59, 59)
        .unwrap();

    let a = SourceFile::new("/shoot/a.jpg", eve, DateSource::Metadata, 10);
    let b = SourceFile::new("/shoot/b.jpg", new_year, DateSource::Metadata, 10);

    assert_eq!(a.year(), 2007);
    assert_eq!(b.year(), 2008);
    assert_eq!(b.interval_since(&a).num_seconds(), 2);
}

#[test]
fn test_sequences_partition_indices() {
    let sequences = [
        Sequence::new(0, 12),
        Sequence {
            kind: SequenceKind::Extras,
            ..Sequence::new(12, 14)
        },
    ];

    let total: usize = sequences.iter().map(Sequence::len).sum();
    assert_eq!(total, 14);
    assert_eq!(sequences[0].end, sequences[1].start);
    assert!(sequences[1].is_extras());
}

#[test]
fn test_config_serde_defaults() {
    let json = r#"{ "source": "/shoot", "output": "/archive", "mode": "date-time" }"#;
    let config: IngestConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.source, PathBuf::from("/shoot"));
    assert_eq!(config.mode, NamingMode::DateTime);
    assert_eq!(config.number_padding, 4);
    assert_eq!(config.start_number, 1);
    assert_eq!(config.gap_threshold, Duration::from_secs(60));
    assert_eq!(config.extras_folder, "Extras");
}

#[test]
fn test_config_builder_defaults_match_new() {
    let built = IngestConfig::builder()
        .source("/shoot")
        .output("/archive")
        .build()
        .unwrap();
    let simple = IngestConfig::new("/shoot", "/archive");

    assert_eq!(built.number_padding, simple.number_padding);
    assert_eq!(built.min_sequence_size, simple.min_sequence_size);
    assert_eq!(built.min_interval_samples, simple.min_interval_samples);
    assert_eq!(built.split_factor, simple.split_factor);
    assert_eq!(built.random_name_length, simple.random_name_length);
}

#[test]
fn test_error_display() {
    let err = IngestError::DestinationExists {
        path: PathBuf::from("/archive/2007/IMG/IMG_0001.jpg"),
    };
    assert!(err.to_string().contains("IMG_0001.jpg"));

    let err = IngestError::NotADirectory {
        path: PathBuf::from("/shoot/file.jpg"),
    };
    assert!(err.to_string().contains("not a directory"));
}
