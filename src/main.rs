//! ingestr - Sequence-aware photo and video ingestion.
//!
//! Usage:
//!   ingestr SOURCE OUTPUT --basename IMG            Number into <OUTPUT>/<year>/IMG
//!   ingestr SOURCE OUTPUT --auto-rename --auto-split Split a timelapse card into sequences
//!   ingestr SOURCE OUTPUT --mode date-time          Name files by capture time
//!   ingestr --help                                  Show help

use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use ingestr_core::{BasenamePreset, IngestConfig, NamingMode};
use ingestr_ops::{IngestComplete, IngestEvent, IngestProgress, start_ingest};

#[derive(Parser)]
#[command(
    name = "ingestr",
    version,
    about = "Copy a card of photos or videos into a year/sequence archive",
    long_about = "ingestr copies every file under SOURCE into OUTPUT/<year>/, renaming \
                  them by sequence number, capture time or a random name.\n\n\
                  With --auto-rename and --auto-split, timelapse cards are split at \
                  abnormal gaps and short runs are set aside in an Extras folder. \
                  Source files are never modified."
)]
struct Cli {
    /// Folder to ingest from (walked recursively, hidden entries skipped)
    source: PathBuf,

    /// Archive root; files land under <OUTPUT>/<year>/
    output: PathBuf,

    /// Only ingest files with this extension (case-insensitive)
    #[arg(short, long)]
    ext: Option<String>,

    /// Naming mode: sequential, date-time or random
    #[arg(short, long, default_value = "sequential")]
    mode: NamingMode,

    /// Basename for sequential names, e.g. "IMG_"
    #[arg(short, long, conflicts_with = "preset")]
    basename: Option<String>,

    /// Ready-made basename: timelapse, date-sequence, img, photo or scan
    #[arg(long)]
    preset: Option<BasenamePreset>,

    /// Digits in sequence numbers
    #[arg(short, long, default_value = "4")]
    padding: usize,

    /// First sequence number
    #[arg(long, default_value = "1")]
    start: u64,

    /// Derive a dated basename per sequence, e.g. 200704161CO_
    #[arg(short = 'r', long)]
    auto_rename: bool,

    /// Split at abnormal gaps between captures (needs --auto-rename)
    #[arg(short = 's', long)]
    auto_split: bool,

    /// Continue numbering after files already in the sequence folder
    #[arg(short, long)]
    add_to_existing: bool,

    /// Length of random names
    #[arg(long, default_value = "8")]
    name_length: usize,

    /// Sequences shorter than this go to the Extras folder
    #[arg(long, default_value = "10")]
    min_sequence_size: usize,

    /// Output format for the summary
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Log more (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Cli {
    fn to_config(&self) -> Result<IngestConfig> {
        let basename = match (&self.basename, self.preset) {
            (Some(basename), _) => basename.clone(),
            (None, Some(preset)) => preset.resolve(Local::now().date_naive()),
            (None, None) => String::new(),
        };

        let config = IngestConfig::builder()
            .source(&self.source)
            .output(&self.output)
            .extension_filter(self.ext.clone().unwrap_or_default())
            .mode(self.mode)
            .basename(basename)
            .number_padding(self.padding)
            .start_number(self.start)
            .auto_rename(self.auto_rename)
            .auto_split(self.auto_split)
            .add_to_existing(self.add_to_existing)
            .random_name_length(self.name_length)
            .min_sequence_size(self.min_sequence_size)
            .build()
            .context("Invalid options")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.auto_split && !cli.auto_rename {
        warn!("--auto-split has no effect without --auto-rename");
    }

    let config = cli.to_config()?;
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling after the current sequence...");
            ctrl_c.cancel();
        }
    });

    eprintln!(
        "Ingesting {} into {}...",
        config.source.display(),
        config.output.display()
    );

    let mut rx = start_ingest(config, cancel);
    while let Some(event) = rx.recv().await {
        match event {
            IngestEvent::Phase(_) => {}
            IngestEvent::Progress(progress) => print_progress(&progress),
            IngestEvent::Complete(complete) => {
                print_complete(&complete, cli.format)?;
                return Ok(());
            }
            IngestEvent::Empty => {
                eprintln!("No files to ingest.");
                return Ok(());
            }
            IngestEvent::Cancelled(progress) => {
                bail!(
                    "Cancelled after {} of {} sequences ({} files copied)",
                    progress.sequences_completed,
                    progress.sequences_total,
                    progress.files_completed
                );
            }
            IngestEvent::Failed(err) => {
                return Err(err).context("Ingest failed");
            }
        }
    }

    bail!("Ingest worker stopped without reporting a result")
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_progress(progress: &IngestProgress) {
    eprintln!(
        "  [{:>3.0}%] sequence {}/{}  {} files, {}",
        progress.fraction() * 100.0,
        progress.sequences_completed,
        progress.sequences_total,
        progress.files_completed,
        format_size(progress.bytes_copied)
    );
}

fn print_complete(complete: &IngestComplete, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(60));
            println!(" {}", complete.message());
            println!(
                " {} files in {} sequence(s), {}",
                complete.files_copied(),
                complete.sequences,
                format_size(complete.bytes_copied)
            );
            if complete.extras_copied > 0 {
                println!(" {} file(s) set aside as extras", complete.extras_copied);
            }
            println!(" Open: {}", complete.folder.display());
            println!("{}", "─".repeat(60));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(complete)?);
        }
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
