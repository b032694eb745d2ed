//! Effective capture-date resolution.

use std::fs::{File, Metadata};
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use tracing::debug;

use ingestr_core::DateSource;

/// Extensions probed for embedded capture metadata (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "tif", "tiff", "heic", "png", "raw", "cr2", "crw", "nef", "arw",
];

/// Literal EXIF date layout. Zone-less by definition of the format.
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Resolves the effective date of a file.
///
/// Fallback order: EXIF `DateTimeOriginal` (or `DateTime` when the former is
/// absent) for image extensions, then the filesystem modification time, then
/// the current wall-clock time. Resolution never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataResolver;

impl MetadataResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self
    }

    /// Resolve a file's effective date, reading its filesystem metadata.
    pub fn resolve(&self, path: &Path) -> (NaiveDateTime, DateSource) {
        let metadata = std::fs::metadata(path).ok();
        self.resolve_with(path, metadata.as_ref())
    }

    /// Resolve a file's effective date using already loaded metadata.
    pub fn resolve_with(
        &self,
        path: &Path,
        metadata: Option<&Metadata>,
    ) -> (NaiveDateTime, DateSource) {
        if is_image(path)
            && let Some(date) = read_capture_date(path)
        {
            debug!(path = %path.display(), %date, "using embedded capture date");
            return (date, DateSource::Metadata);
        }

        if let Some(date) = metadata.and_then(modified_date) {
            debug!(path = %path.display(), %date, "using modification time");
            return (date, DateSource::Modified);
        }

        let now = Local::now().naive_local();
        debug!(path = %path.display(), date = %now, "no usable timestamp, using current time");
        (now, DateSource::Now)
    }
}

/// Check whether the path has an extension that may carry EXIF.
fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Read the embedded capture date from an image container.
///
/// The first present field wins; a present but malformed field does not fall
/// back to the next tag.
fn read_capture_date(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = Reader::new().read_from_container(&mut reader).ok()?;

    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))?;

    match &field.value {
        Value::Ascii(values) => values
            .first()
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .and_then(parse_exif_datetime),
        _ => None,
    }
}

/// Parse an EXIF timestamp of the form `YYYY:MM:DD HH:MM:SS`.
pub fn parse_exif_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(trimmed, EXIF_DATE_FORMAT).ok()
}

fn modified_date(metadata: &Metadata) -> Option<NaiveDateTime> {
    metadata
        .modified()
        .ok()
        .map(|time| DateTime::<Local>::from(time).naive_local())
}
