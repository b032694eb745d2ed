//! Destination name allocation.
//!
//! Sequential names look like `<basename><padded number>.<ext>` and live in
//! `<output>/<year>/<basename without trailing underscore>/`. When appending
//! to an existing archive the next number and the digit width are taken from
//! the file carrying the highest number already in that folder.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use regex::Regex;
use tracing::{debug, warn};

use ingestr_core::{IngestConfig, SourceFile};

/// Separator that always terminates a sequential basename.
const BASENAME_SEPARATOR: char = '_';

/// Size of the `[a-zA-Z0-9]` alphabet.
const ALPHANUMERIC_LEN: u128 = 62;

/// Highest number found in an existing sequence folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastSequenceNumber {
    /// Largest numeric suffix.
    pub last_number: u64,
    /// Digit count of that suffix as written on disk.
    pub padding: usize,
}

/// Append the basename separator if missing.
pub fn normalize_basename(basename: &str) -> String {
    if basename.ends_with(BASENAME_SEPARATOR) {
        basename.to_string()
    } else {
        format!("{basename}{BASENAME_SEPARATOR}")
    }
}

/// Folder name for a basename: the basename minus one trailing separator.
pub fn folder_name(basename: &str) -> &str {
    basename.strip_suffix(BASENAME_SEPARATOR).unwrap_or(basename)
}

/// Join a stem and an extension; no dot for extension-less files.
fn with_extension(stem: &str, extension: &str) -> String {
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{extension}")
    }
}

/// `<basename><number padded to width>.<ext>`.
pub fn sequential_name(number: u64, basename: &str, padding: usize, extension: &str) -> String {
    let width = padding.max(1);
    with_extension(&format!("{basename}{number:0width$}"), extension)
}

/// `YYYY-MM-DD-HHmmss-mmm.<ext>` from an effective date.
pub fn date_time_name(date: NaiveDateTime, extension: &str) -> String {
    // Leap seconds report nanoseconds past 1e9.
    let millis = (date.nanosecond() % 1_000_000_000) / 1_000_000;
    let stem = format!("{}-{millis:03}", date.format("%Y-%m-%d-%H%M%S"));
    with_extension(&stem, extension)
}

/// `<YYYYMMDD><ordinal><suffix>_`.
pub fn derive_basename(date: NaiveDate, ordinal: u32, suffix: &str) -> String {
    format!(
        "{}{ordinal}{suffix}{BASENAME_SEPARATOR}",
        date.format("%Y%m%d")
    )
}

/// Find the highest `<basename><digits>.<ext>` file in `folder`.
///
/// Returns `None` when the folder is missing or unreadable, or when no file
/// matches with a number above zero. The scan is read-only.
pub fn find_last_sequence_number(folder: &Path, basename: &str) -> Option<LastSequenceNumber> {
    let pattern = format!(r"^{}(\d+)\.[^.]+$", regex::escape(basename));
    let re = Regex::new(&pattern).ok()?;

    let entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(folder = %folder.display(), error = %err, "no existing sequence folder");
            return None;
        }
    };

    let mut best: Option<LastSequenceNumber> = None;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(digits) = re.captures(name).and_then(|c| c.get(1)) else {
            continue;
        };
        let Ok(number) = digits.as_str().parse::<u64>() else {
            continue;
        };
        if number > best.map_or(0, |b| b.last_number) {
            best = Some(LastSequenceNumber {
                last_number: number,
                padding: digits.as_str().len(),
            });
        }
    }
    best
}

/// Next free per-day ordinal under `<output>/<year>`.
///
/// Looks for folders named `<YYYYMMDD><digits><suffix>`; returns one more
/// than the highest ordinal found, or 1.
pub fn next_day_ordinal(output: &Path, date: NaiveDate, suffix: &str) -> u32 {
    let year_folder = output.join(date.format("%Y").to_string());
    let entries = match fs::read_dir(&year_folder) {
        Ok(entries) => entries,
        Err(_) => return 1,
    };

    let pattern = format!(
        r"^{}(\d+){}$",
        date.format("%Y%m%d"),
        regex::escape(suffix)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return 1;
    };

    let highest = entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_str()?;
            re.captures(name)?.get(1)?.as_str().parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0);

    highest + 1
}

/// Per-sequence naming state.
///
/// Numbers only ever go up while a sequence is being named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingContext {
    basename: String,
    padding: usize,
    next_number: u64,
}

impl NamingContext {
    /// Create a context; the basename gains a trailing separator if needed
    /// and the padding is at least one digit.
    pub fn new(basename: impl AsRef<str>, padding: usize, start_number: u64) -> Self {
        Self {
            basename: normalize_basename(basename.as_ref()),
            padding: padding.max(1),
            next_number: start_number,
        }
    }

    /// Build the context for a sequence whose first file is `first`.
    ///
    /// Derives the dated basename when auto-rename is on and resumes after
    /// existing files when appending to an archive.
    pub fn for_sequence(config: &IngestConfig, first: &SourceFile) -> Self {
        let basename = if config.auto_rename {
            let day = first.effective_date.date();
            let ordinal = next_day_ordinal(&config.output, day, &config.ordinal_suffix);
            derive_basename(day, ordinal, &config.ordinal_suffix)
        } else {
            config.basename.clone()
        };

        let mut context = Self::new(basename, config.number_padding, config.start_number);

        if config.add_to_existing {
            let folder = context.folder(&config.output, first.year());
            if let Some(found) = find_last_sequence_number(&folder, &context.basename) {
                match found.last_number.checked_add(1) {
                    Some(next) => {
                        debug!(
                            folder = %folder.display(),
                            last = found.last_number,
                            padding = found.padding,
                            "continuing existing sequence"
                        );
                        context.next_number = next;
                        context.padding = found.padding.max(1);
                    }
                    None => warn!(
                        folder = %folder.display(),
                        last = found.last_number,
                        "existing sequence number cannot be continued, using start number"
                    ),
                }
            }
        }

        context
    }

    /// Basename including its trailing separator.
    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Sequence folder name.
    pub fn folder_name(&self) -> &str {
        folder_name(&self.basename)
    }

    /// Digit width in use.
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Number the next file will receive.
    pub fn next_number(&self) -> u64 {
        self.next_number
    }

    /// `<output>/<year>/<folder name>`.
    pub fn folder(&self, output: &Path, year: i32) -> PathBuf {
        output.join(year.to_string()).join(self.folder_name())
    }

    /// Name the next file and advance the counter.
    pub fn allocate(&mut self, extension: &str) -> String {
        let name = sequential_name(self.next_number, &self.basename, self.padding, extension);
        self.next_number = self.next_number.saturating_add(1);
        name
    }
}

/// Random names already handed out during one run.
#[derive(Debug, Default)]
pub struct RandomNameRegistry {
    used: HashSet<String>,
}

impl RandomNameRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of names handed out.
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// Check if no names have been handed out.
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Check if a name was already handed out.
    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Draw a name of `length` alphanumerics not used before in this run.
    ///
    /// When every name of that length is taken the length grows by one.
    pub fn next_name(&mut self, length: usize) -> String {
        let mut length = length.max(1);
        while self.is_exhausted(length) {
            warn!(length, "random names of this length exhausted, lengthening");
            length += 1;
        }

        let mut rng = rng();
        loop {
            let candidate: String = (0..length)
                .map(|_| char::from(rng.sample(Alphanumeric)))
                .collect();
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Draw a unique random file name with the given extension.
    pub fn allocate(&mut self, length: usize, extension: &str) -> String {
        let stem = self.next_name(length);
        with_extension(&stem, extension)
    }

    fn is_exhausted(&self, length: usize) -> bool {
        let Some(capacity) = u32::try_from(length)
            .ok()
            .and_then(|len| ALPHANUMERIC_LEN.checked_pow(len))
        else {
            return false;
        };
        if capacity > self.used.len() as u128 {
            return false;
        }
        let taken = self
            .used
            .iter()
            .filter(|name| name.len() == length)
            .count() as u128;
        taken >= capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestr_core::DateSource;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), "").unwrap();
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2007, 4, 16).unwrap()
    }

    #[test]
    fn test_find_last_sequence_number_basic() {
        let temp = TempDir::new().unwrap();
        touch(
            temp.path(),
            &["200704161CO_0001.jpg", "200704161CO_0002.jpg", "200704161CO_0100.jpg"],
        );
        let found = find_last_sequence_number(temp.path(), "200704161CO_").unwrap();
        assert_eq!(found.last_number, 100);
        assert_eq!(found.padding, 4);
    }

    #[test]
    fn test_find_last_sequence_number_no_matches() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), &["IMG_0001.jpg", "IMG_0002.jpg"]);
        assert_eq!(find_last_sequence_number(temp.path(), "200704161CO_"), None);
    }

    #[test]
    fn test_find_last_sequence_number_padding_from_max() {
        let temp = TempDir::new().unwrap();
        touch(
            temp.path(),
            &["200704161CO_01.jpg", "200704161CO_002.jpg", "200704161CO_0003.jpg"],
        );
        let found = find_last_sequence_number(temp.path(), "200704161CO_").unwrap();
        assert_eq!(found.last_number, 3);
        assert_eq!(found.padding, 4);

        let temp = TempDir::new().unwrap();
        touch(temp.path(), &["IMG_000001.jpg", "IMG_07.jpg"]);
        let found = find_last_sequence_number(temp.path(), "IMG_").unwrap();
        assert_eq!(found.last_number, 7);
        assert_eq!(found.padding, 2);
    }

    #[test]
    fn test_find_last_sequence_number_requires_exact_prefix() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), &["200704161CO0001.jpg", "200704161CO_0002.jpg"]);
        let found = find_last_sequence_number(temp.path(), "200704161CO_").unwrap();
        assert_eq!(found.last_number, 2);
        assert_eq!(found.padding, 4);
    }

    #[test]
    fn test_find_last_sequence_number_mixed_extensions() {
        let temp = TempDir::new().unwrap();
        touch(
            temp.path(),
            &[
                "200704161CO_0001.jpg",
                "200704161CO_0002.png",
                "200704161CO_0003.tif",
                "200704161CO_0009",
                "200704161CO_0010.tar.gz",
                "randomfile.txt",
            ],
        );
        let found = find_last_sequence_number(temp.path(), "200704161CO_").unwrap();
        assert_eq!(found.last_number, 3);
    }

    #[test]
    fn test_find_last_sequence_number_escapes_basename() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), &["a.b_0004.jpg", "axb_0009.jpg"]);
        let found = find_last_sequence_number(temp.path(), "a.b_").unwrap();
        assert_eq!(found.last_number, 4);
    }

    #[test]
    fn test_find_last_sequence_number_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let names: Vec<String> = (1..=100).map(|n| format!("IMG_{n:04}.jpg")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        touch(temp.path(), &refs);

        for _ in 0..3 {
            let found = find_last_sequence_number(temp.path(), "IMG_").unwrap();
            assert_eq!(found.last_number + 1, 101);
        }
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 100);
    }

    #[test]
    fn test_find_last_sequence_number_missing_folder() {
        assert_eq!(find_last_sequence_number(Path::new("/no/such/folder"), "IMG_"), None);
    }

    #[test]
    fn test_sequential_name() {
        assert_eq!(sequential_name(101, "200704161CO_", 4, "jpg"), "200704161CO_0101.jpg");
        assert_eq!(sequential_name(5, "IMG_", 4, "jpg"), "IMG_0005.jpg");
        assert_eq!(sequential_name(12345, "IMG_", 4, "jpg"), "IMG_12345.jpg");
        assert_eq!(sequential_name(7, "IMG_", 0, "CR2"), "IMG_7.CR2");
        assert_eq!(sequential_name(7, "IMG_", 2, ""), "IMG_07");
    }

    #[test]
    fn test_basename_separator_handling() {
        assert_eq!(normalize_basename("IMG"), "IMG_");
        assert_eq!(normalize_basename("IMG_"), "IMG_");
        assert_eq!(folder_name("200704161CO_"), "200704161CO");
        assert_eq!(folder_name("Scan"), "Scan");
    }

    #[test]
    fn test_date_time_name() {
        let date = day().and_hms_milli_opt(14, 5, 9, 42).unwrap();
        assert_eq!(date_time_name(date, "jpg"), "2007-04-16-140509-042.jpg");

        let whole = day().and_hms_opt(14, 5, 9).unwrap();
        assert_eq!(date_time_name(whole, "mov"), "2007-04-16-140509-000.mov");
    }

    #[test]
    fn test_derive_basename() {
        assert_eq!(derive_basename(day(), 1, "CO"), "200704161CO_");
        assert_eq!(derive_basename(day(), 2, "CO"), "200704162CO_");
    }

    #[test]
    fn test_next_day_ordinal() {
        let temp = TempDir::new().unwrap();
        assert_eq!(next_day_ordinal(temp.path(), day(), "CO"), 1);

        let year = temp.path().join("2007");
        fs::create_dir_all(year.join("200704161CO")).unwrap();
        fs::create_dir_all(year.join("200704163CO")).unwrap();
        fs::create_dir_all(year.join("200704175CO")).unwrap();
        fs::create_dir_all(year.join("Extras")).unwrap();
        fs::write(year.join("200704169CO"), "not a folder").unwrap();

        assert_eq!(next_day_ordinal(temp.path(), day(), "CO"), 4);
        assert_eq!(next_day_ordinal(temp.path(), day(), "TL"), 1);
    }

    #[test]
    fn test_naming_context_allocates_monotonically() {
        let mut context = NamingContext::new("IMG", 3, 9);
        assert_eq!(context.basename(), "IMG_");
        assert_eq!(context.folder_name(), "IMG");
        assert_eq!(context.allocate("jpg"), "IMG_009.jpg");
        assert_eq!(context.allocate("JPG"), "IMG_010.JPG");
        assert_eq!(context.next_number(), 11);
        assert_eq!(
            context.folder(Path::new("/archive"), 2007),
            PathBuf::from("/archive/2007/IMG")
        );
    }

    #[test]
    fn test_naming_context_clamps_padding() {
        let mut context = NamingContext::new("IMG_", 0, 1);
        assert_eq!(context.padding(), 1);
        assert_eq!(context.allocate("jpg"), "IMG_1.jpg");
    }

    #[test]
    fn test_for_sequence_continues_existing_archive() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("2007").join("200704161CO");
        fs::create_dir_all(&folder).unwrap();
        touch(&folder, &["200704161CO_00041.jpg", "200704161CO_00007.jpg"]);

        let mut config = IngestConfig::new("/shoot", temp.path());
        config.basename = "200704161CO_".to_string();
        config.add_to_existing = true;
        config.number_padding = 3;

        let first = SourceFile::new(
            "/shoot/a.jpg",
            day().and_hms_opt(9, 0, 0).unwrap(),
            DateSource::Metadata,
            0,
        );
        let mut context = NamingContext::for_sequence(&config, &first);
        assert_eq!(context.next_number(), 42);
        assert_eq!(context.padding(), 5);
        assert_eq!(context.allocate("jpg"), "200704161CO_00042.jpg");
    }

    #[test]
    fn test_for_sequence_ignores_unfollowable_number() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("2007").join("IMG");
        fs::create_dir_all(&folder).unwrap();
        touch(&folder, &["IMG_18446744073709551615.txt"]);

        let mut config = IngestConfig::new("/shoot", temp.path());
        config.basename = "IMG_".to_string();
        config.add_to_existing = true;

        let first = SourceFile::new(
            "/shoot/a.txt",
            day().and_hms_opt(9, 0, 0).unwrap(),
            DateSource::Modified,
            0,
        );
        let mut context = NamingContext::for_sequence(&config, &first);
        assert_eq!(context.next_number(), 1);
        assert_eq!(context.padding(), 4);
        assert_eq!(context.allocate("txt"), "IMG_0001.txt");
    }

    #[test]
    fn test_allocate_saturates_at_max() {
        let mut context = NamingContext::new("IMG_", 1, u64::MAX);
        let name = format!("IMG_{}.jpg", u64::MAX);
        assert_eq!(context.allocate("jpg"), name);
        assert_eq!(context.next_number(), u64::MAX);
    }

    #[test]
    fn test_for_sequence_auto_rename_picks_next_ordinal() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("2007").join("200704161CO")).unwrap();

        let mut config = IngestConfig::new("/shoot", temp.path());
        config.auto_rename = true;
        config.start_number = 5;

        let first = SourceFile::new(
            "/shoot/a.jpg",
            day().and_hms_opt(9, 0, 0).unwrap(),
            DateSource::Metadata,
            0,
        );
        let context = NamingContext::for_sequence(&config, &first);
        assert_eq!(context.basename(), "200704162CO_");
        assert_eq!(context.next_number(), 5);
        assert_eq!(context.padding(), 4);
    }

    #[test]
    fn test_random_names_are_unique_alphanumeric() {
        let mut registry = RandomNameRegistry::new();
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let name = registry.next_name(6);
            assert_eq!(name.len(), 6);
            assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(seen.insert(name));
        }
        assert_eq!(registry.len(), 500);
    }

    #[test]
    fn test_random_names_lengthen_when_exhausted() {
        let mut registry = RandomNameRegistry::new();
        let names: Vec<String> = (0..70).map(|_| registry.next_name(1)).collect();
        assert_eq!(names.iter().filter(|n| n.len() == 1).count(), 62);
        assert_eq!(names.iter().filter(|n| n.len() == 2).count(), 8);
    }

    #[test]
    fn test_random_allocate_appends_extension() {
        let mut registry = RandomNameRegistry::new();
        let name = registry.allocate(8, "heic");
        assert!(name.ends_with(".heic"));
        assert_eq!(name.len(), 13);
        assert!(registry.contains(name.trim_end_matches(".heic")));
    }
}
