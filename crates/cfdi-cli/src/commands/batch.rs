//! Batch command - merge many invoice files into the ledger.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use cfdi_core::models::config::ExtractionConfig;
use cfdi_core::{BatchReport, CsvLedgerStore, ProgressSink, SaveOutcome, Session};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Ledger file to merge into (default: ledger.default_path from config)
    #[arg(short, long)]
    ledger: Option<PathBuf>,

    /// List fields that fell back to "Unknown" or zero
    #[arg(long)]
    show_warnings: bool,

    /// Exit with an error if any file failed to process
    #[arg(long)]
    strict: bool,
}

/// Progress bar over the files of one run.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self { bar }
    }
}

impl ProgressSink for BarProgress {
    fn start(&mut self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn file_done(&mut self, done: usize, _total: usize) {
        self.bar.set_position(done as u64);
    }

    fn finish(&mut self) {
        self.bar.finish_with_message("Complete");
    }
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::config::load(config_path)?;

    let files = expand_inputs(&args.inputs, &config.extraction)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for: {}", args.inputs.join(" "));
    }

    let mut session = Session::new(&config);
    if let Some(ledger) = args.ledger {
        session.set_ledger_path(ledger);
    }
    let queued = session.queue(files);

    println!("{} Found {} files to process", style("ℹ").blue(), queued);

    let mut progress = BarProgress::new();
    let report = session.run(&CsvLedgerStore::new(), &mut progress)?;

    print_summary(&report, args.show_warnings, start);

    if let SaveOutcome::Failed(e) = &report.save {
        anyhow::bail!("Ledger was not saved: {}", e);
    }
    if args.strict && !report.errors.is_empty() {
        anyhow::bail!("{} files failed to process", report.errors.len());
    }

    Ok(())
}

/// Expand glob patterns. Plain paths are kept as given so that a missing
/// file is reported as a per-file failure; glob matches are filtered by the
/// configured extensions.
fn expand_inputs(inputs: &[String], config: &ExtractionConfig) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut seen = BTreeSet::new();

    for input in inputs {
        let matches: Vec<PathBuf> = if is_pattern(input) {
            glob(input)?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file() && config.accepts(p))
                .collect()
        } else {
            vec![PathBuf::from(input)]
        };

        debug!("{} expanded to {} files", input, matches.len());
        for path in matches {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn print_summary(report: &BatchReport, show_warnings: bool, start: Instant) {
    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        report.attempted(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(report.processed.len()).green(),
        style(report.errors.len()).red()
    );
    println!(
        "   Ledger: {} rows, sum of totals {}",
        report.table.len(),
        report.table.sum_of_totals()
    );

    if !report.errors.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for error in &report.errors {
            println!("  - {}", error);
        }
    }

    if show_warnings && !report.warnings.is_empty() {
        println!();
        println!("{}", style("Warnings:").yellow());
        for (path, warning) in &report.warnings {
            println!("  - {}: {}", path.display(), warning);
        }
    }

    if report.mixed_date_formats {
        println!();
        println!(
            "{} Ledger dates use more than one format; row order is not chronological.",
            style("⚠").yellow()
        );
    }

    println!();
    match &report.save {
        SaveOutcome::Saved(path) => println!(
            "{} Ledger saved to {}",
            style("✓").green(),
            path.display()
        ),
        SaveOutcome::Skipped => println!(
            "{} No rows to save; ledger left unchanged",
            style("ℹ").blue()
        ),
        SaveOutcome::Failed(e) => println!("{} {}", style("✗").red(), e),
    }
}
