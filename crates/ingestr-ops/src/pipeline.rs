//! The ingest pipeline.
//!
//! enumerate -> resolve dates -> sort -> segment -> name -> copy, strictly
//! in that order on one thread. Observers only see the events passed to the
//! `emit` callback; [`start_ingest`] forwards them over a channel.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ingestr_analyze::{IntervalAnalyzer, IntervalConfig, SegmentConfig, Segmenter};
use ingestr_core::{IngestConfig, IngestError, NamingMode, Sequence, SourceFile};
use ingestr_scan::SourceScanner;

use crate::copy::{copy_file, copy_keeping_name, ensure_folder};
use crate::naming::{NamingContext, RandomNameRegistry, date_time_name};
use crate::progress::{IngestComplete, IngestEvent, IngestOutcome, IngestPhase, IngestProgress};
use crate::INGEST_CHANNEL_SIZE;

/// Start an ingest run on a blocking worker.
///
/// Returns a receiver for phase, progress and terminal events. The last
/// event is always one of `Complete`, `Empty`, `Cancelled` or `Failed`.
pub fn start_ingest(config: IngestConfig, cancel: CancellationToken) -> mpsc::Receiver<IngestEvent> {
    let (tx, rx) = mpsc::channel(INGEST_CHANNEL_SIZE);

    tokio::spawn(async move {
        let events = tx.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let mut pipeline = IngestPipeline::new(config);
            pipeline.run(&cancel, |event| {
                let _ = events.blocking_send(event);
            })
        })
        .await;

        finish(&tx, joined).await;
    });

    rx
}

/// Send the terminal event for a finished worker.
///
/// A worker that died without reporting gets the `Errored` phase the
/// pipeline would have emitted itself.
async fn finish(
    tx: &mpsc::Sender<IngestEvent>,
    joined: Result<Result<IngestOutcome, IngestError>, JoinError>,
) {
    let result = match joined {
        Ok(result) => result,
        Err(err) => {
            warn!(error = %err, "ingest worker died");
            let _ = tx.send(IngestEvent::Phase(IngestPhase::Errored)).await;
            Err(IngestError::Other {
                message: err.to_string(),
            })
        }
    };

    let _ = tx.send(IngestEvent::from(result)).await;
}

/// Totals accumulated while sequences are processed.
#[derive(Debug, Default)]
struct RunTotals {
    files_renamed: usize,
    extras_copied: usize,
    has_extras: bool,
}

/// One ingest run.
///
/// Owns the random-name registry, so random names are unique within the run
/// and nothing leaks into the next one.
#[derive(Debug)]
pub struct IngestPipeline {
    config: IngestConfig,
    scanner: SourceScanner,
    random_names: RandomNameRegistry,
}

impl IngestPipeline {
    /// Create a pipeline for the given configuration.
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            scanner: SourceScanner::new(),
            random_names: RandomNameRegistry::new(),
        }
    }

    /// The run configuration.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Run the ingest to completion, cancellation or the first fatal error.
    ///
    /// Cancellation is only checked between sequences. Files copied before a
    /// cancellation or an error stay in place.
    pub fn run<F>(&mut self, cancel: &CancellationToken, mut emit: F) -> Result<IngestOutcome, IngestError>
    where
        F: FnMut(IngestEvent),
    {
        let result = self.run_phases(cancel, &mut emit);
        match &result {
            Ok(IngestOutcome::Cancelled(_)) => emit(IngestEvent::Phase(IngestPhase::Cancelled)),
            Ok(_) => emit(IngestEvent::Phase(IngestPhase::Completed)),
            Err(err) => {
                warn!(error = %err, "ingest aborted");
                emit(IngestEvent::Phase(IngestPhase::Errored));
            }
        }
        result
    }

    fn run_phases<F>(&mut self, cancel: &CancellationToken, emit: &mut F) -> Result<IngestOutcome, IngestError>
    where
        F: FnMut(IngestEvent),
    {
        self.check_config()?;

        emit(IngestEvent::Phase(IngestPhase::Enumerating));
        let files = self.scanner.scan(&self.config)?;
        let Some(first) = files.first() else {
            info!(source = %self.config.source.display(), "no eligible files, nothing to do");
            return Ok(IngestOutcome::Empty);
        };
        let year = first.year();

        emit(IngestEvent::Phase(IngestPhase::Segmenting));
        let sequences = self.plan_sequences(&files);
        info!(
            files = files.len(),
            sequences = sequences.len(),
            extras = sequences.iter().filter(|s| s.is_extras()).count(),
            "planned sequences"
        );

        emit(IngestEvent::Phase(IngestPhase::Copying));
        let mut progress = IngestProgress::new(files.len(), sequences.len());
        let mut totals = RunTotals::default();

        for sequence in &sequences {
            if cancel.is_cancelled() {
                info!(
                    completed = progress.sequences_completed,
                    total = progress.sequences_total,
                    "ingest cancelled"
                );
                return Ok(IngestOutcome::Cancelled(progress));
            }

            let batch = &files[sequence.range()];
            let folder = if sequence.is_extras() {
                totals.has_extras = true;
                totals.extras_copied += batch.len();
                self.copy_extras(batch, &mut progress)?
            } else {
                totals.files_renamed += batch.len();
                match self.config.mode {
                    NamingMode::Sequential => self.copy_numbered(batch, &mut progress)?,
                    NamingMode::DateTime | NamingMode::Random => {
                        self.copy_renamed(batch, &mut progress)?
                    }
                }
            };

            progress.sequences_completed += 1;
            progress.current_folder = Some(folder);
            emit(IngestEvent::Progress(progress.clone()));
        }

        let year_folder = self.config.output.join(year.to_string());
        let folder = if totals.has_extras {
            year_folder.join(&self.config.extras_folder)
        } else {
            year_folder
        };

        let complete = IngestComplete {
            folder,
            has_extras: totals.has_extras,
            year,
            files_renamed: totals.files_renamed,
            extras_copied: totals.extras_copied,
            bytes_copied: progress.bytes_copied,
            sequences: sequences.len(),
        };
        info!(
            folder = %complete.folder.display(),
            files = complete.files_copied(),
            has_extras = complete.has_extras,
            "ingest complete"
        );
        Ok(IngestOutcome::Completed(complete))
    }

    fn check_config(&self) -> Result<(), IngestError> {
        if self.config.mode == NamingMode::Sequential
            && !self.config.auto_rename
            && self.config.basename.trim().is_empty()
        {
            return Err(IngestError::InvalidConfig {
                message: "a basename is required for sequential naming without auto-rename"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Split the sorted files into sequences according to the naming policy.
    fn plan_sequences(&self, files: &[SourceFile]) -> Vec<Sequence> {
        if self.config.mode != NamingMode::Sequential {
            return vec![Sequence::new(0, files.len())];
        }

        let segmenter = Segmenter::with_config(SegmentConfig::from(&self.config));
        if !self.config.splits_sequences() {
            return segmenter.unsplit(files.len());
        }

        let analyzer = IntervalAnalyzer::with_config(IntervalConfig::from(&self.config));
        let interval = analyzer.normal_interval(files);
        if interval.is_none() {
            debug!("normal interval undetectable, keeping a single sequence");
        }
        segmenter.segment(files, interval)
    }

    /// Copy a sequence under `<basename><number>` names.
    fn copy_numbered(
        &self,
        batch: &[SourceFile],
        progress: &mut IngestProgress,
    ) -> Result<PathBuf, IngestError> {
        let Some(first) = batch.first() else {
            return Ok(self.config.output.clone());
        };
        let mut context = NamingContext::for_sequence(&self.config, first);
        let sequence_folder = context.folder(&self.config.output, first.year());
        info!(
            basename = context.basename(),
            start = context.next_number(),
            padding = context.padding(),
            files = batch.len(),
            "numbering sequence"
        );

        for file in batch {
            let folder = context.folder(&self.config.output, file.year());
            ensure_folder(&folder)?;
            let name = context.allocate(&file.extension);
            let bytes = copy_file(&file.path, &folder.join(name))?;
            progress.complete_file(bytes);
        }

        Ok(sequence_folder)
    }

    /// Copy a batch under date-time or random names into the year folder.
    fn copy_renamed(
        &mut self,
        batch: &[SourceFile],
        progress: &mut IngestProgress,
    ) -> Result<PathBuf, IngestError> {
        let mut last_folder = self.config.output.clone();
        for file in batch {
            let folder = year_folder(&self.config.output, file);
            ensure_folder(&folder)?;
            let name = match self.config.mode {
                NamingMode::Random => self
                    .random_names
                    .allocate(self.config.random_name_length, &file.extension),
                _ => date_time_name(file.effective_date, &file.extension),
            };
            let bytes = copy_file(&file.path, &folder.join(name))?;
            progress.complete_file(bytes);
            last_folder = folder;
        }
        Ok(last_folder)
    }

    /// Copy an undersized sequence into the extras folder, names unchanged.
    fn copy_extras(
        &self,
        batch: &[SourceFile],
        progress: &mut IngestProgress,
    ) -> Result<PathBuf, IngestError> {
        let mut last_folder = self.config.output.clone();
        for file in batch {
            let folder = year_folder(&self.config.output, file).join(&self.config.extras_folder);
            ensure_folder(&folder)?;
            let (_, bytes) = copy_keeping_name(&file.path, &folder)?;
            progress.complete_file(bytes);
            last_folder = folder;
        }
        debug!(files = batch.len(), "routed sequence to extras");
        Ok(last_folder)
    }
}

fn year_folder(output: &Path, file: &SourceFile) -> PathBuf {
    output.join(file.year().to_string())
}
