//! One processing session: the chosen ledger, the queue of invoice files and
//! the files already consolidated.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::{ExtractionError, PersistenceError, Result, SessionError};
use crate::invoice::{DocumentExtractor, InvoiceExtractor};
use crate::ledger::{aggregate, has_mixed_date_formats, LedgerStore, LedgerTable};
use crate::models::config::LedgerConfig;

/// Receives progress notifications during a run. Display only.
pub trait ProgressSink {
    /// Called once before the first file.
    fn start(&mut self, _total: usize) {}

    /// Called after each file, successful or not.
    fn file_done(&mut self, done: usize, total: usize);

    /// Called once after the last file.
    fn finish(&mut self) {}
}

/// Progress sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn file_done(&mut self, _done: usize, _total: usize) {}
}

/// What happened to the ledger file at the end of a run.
#[derive(Debug)]
pub enum SaveOutcome {
    /// Written to the path.
    Saved(PathBuf),
    /// Nothing to write; the file was left alone.
    Skipped,
    /// Writing failed. The in-memory table in the report is still valid.
    Failed(PersistenceError),
}

impl SaveOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SaveOutcome::Failed(_))
    }
}

/// Summary of one run.
#[derive(Debug)]
pub struct BatchReport {
    /// Merged, deduplicated and sorted ledger.
    pub table: LedgerTable,
    /// Files extracted successfully, in processing order.
    pub processed: Vec<PathBuf>,
    /// Files that failed, with the reason.
    pub errors: Vec<ExtractionError>,
    /// Per-file fallback warnings.
    pub warnings: Vec<(PathBuf, String)>,
    /// Ledger save result.
    pub save: SaveOutcome,
    /// The date column mixes representations, so its order is not chronological.
    pub mixed_date_formats: bool,
}

impl BatchReport {
    /// Number of files attempted.
    pub fn attempted(&self) -> usize {
        self.processed.len() + self.errors.len()
    }
}

/// Processing session state.
#[derive(Debug, Clone)]
pub struct Session {
    ledger_path: Option<PathBuf>,
    queue: Vec<PathBuf>,
    processed: HashSet<PathBuf>,
    extractor: DocumentExtractor,
    skip_empty_save: bool,
}

impl Session {
    /// Create a session from configuration.
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            ledger_path: config.ledger.default_path.clone(),
            queue: Vec::new(),
            processed: HashSet::new(),
            extractor: DocumentExtractor::from_config(&config.extraction),
            skip_empty_save: config.ledger.skip_empty_save,
        }
    }

    /// Choose the ledger file.
    pub fn set_ledger_path(&mut self, path: impl Into<PathBuf>) {
        self.ledger_path = Some(path.into());
    }

    pub fn ledger_path(&self) -> Option<&Path> {
        self.ledger_path.as_deref()
    }

    /// Add files to the queue, skipping ones already queued or already
    /// processed in this session. Returns how many were added.
    pub fn queue<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut added = 0;
        for path in paths {
            let path = path.into();
            if self.processed.contains(&path) || self.queue.contains(&path) {
                info!("Skipping {}: already queued or processed", path.display());
                continue;
            }
            self.queue.push(path);
            added += 1;
        }
        added
    }

    pub fn queued(&self) -> &[PathBuf] {
        &self.queue
    }

    pub fn is_processed(&self, path: &Path) -> bool {
        self.processed.contains(path)
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Extract every queued file, merge into the ledger and save it.
    ///
    /// Per-file failures are collected in the report and never stop the run.
    /// A ledger that exists but cannot be loaded aborts before any file is
    /// read, so it is never overwritten. A failed save is reported in
    /// [`BatchReport::save`]. The queue is emptied after the run.
    pub fn run<S, P>(&mut self, store: &S, progress: &mut P) -> Result<BatchReport>
    where
        S: LedgerStore + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let ledger_path = self.ledger_path.clone().ok_or(SessionError::NoLedgerPath)?;
        if self.queue.is_empty() {
            return Err(SessionError::NothingQueued.into());
        }

        let existing = store.load(&ledger_path)?;
        let files = std::mem::take(&mut self.queue);
        let total = files.len();

        let mut records = Vec::with_capacity(total);
        let mut processed = Vec::with_capacity(total);
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        progress.start(total);
        for (i, path) in files.into_iter().enumerate() {
            match self.extractor.extract(&path) {
                Ok(result) => {
                    warnings.extend(result.warnings.into_iter().map(|w| (path.clone(), w)));
                    records.push(result.record);
                    processed.push(path);
                }
                Err(e) => {
                    warn!("Failed to process {}", e);
                    errors.push(e);
                }
            }
            progress.file_done(i + 1, total);
        }
        progress.finish();

        let table = aggregate(existing, records);
        let mixed_date_formats = has_mixed_date_formats(table.rows());
        if mixed_date_formats {
            warn!("Ledger mixes date formats; row order is not chronological");
        }

        let save = if table.is_empty() && self.skip_empty_save {
            SaveOutcome::Skipped
        } else {
            match store.save(&ledger_path, &table) {
                Ok(()) => SaveOutcome::Saved(ledger_path),
                Err(e) => {
                    error!("{}", e);
                    SaveOutcome::Failed(e)
                }
            }
        };

        self.processed.extend(processed.iter().cloned());

        info!(
            "Run complete: {} processed, {} failed, {} ledger rows",
            processed.len(),
            errors.len(),
            table.len()
        );

        Ok(BatchReport {
            table,
            processed,
            errors,
            warnings,
            save,
            mixed_date_formats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::CsvLedgerStore;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::fs;

    fn invoice(folio: &str, fecha: &str, total: &str) -> String {
        format!(
            r#"<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4" Fecha="{fecha}" Folio="{folio}" SubTotal="{total}" Total="{total}">
  <cfdi:Emisor Rfc="EKU9003173C9" Nombre="ESCUELA KEMPER URGATE"/>
</cfdi:Comprobante>"#
        )
    }

    fn session_in(dir: &Path) -> Session {
        let mut session = Session::new(&LedgerConfig::default());
        session.set_ledger_path(dir.join("ledger.csv"));
        session
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(usize, usize)>,
    }

    impl ProgressSink for Recorder {
        fn file_done(&mut self, done: usize, total: usize) {
            self.calls.push((done, total));
        }
    }

    /// Store whose save always fails, as with a ledger locked by another program.
    struct LockedStore;

    impl LedgerStore for LockedStore {
        fn load(&self, _path: &Path) -> std::result::Result<LedgerTable, PersistenceError> {
            Ok(LedgerTable::new())
        }

        fn save(&self, path: &Path, _table: &LedgerTable) -> std::result::Result<(), PersistenceError> {
            Err(PersistenceError::Save {
                path: path.to_path_buf(),
                reason: "file is locked".to_string(),
            })
        }
    }

    #[test]
    fn test_run_requires_ledger_and_queue() {
        let mut session = Session::new(&LedgerConfig::default());
        let err = session.run(&CsvLedgerStore::new(), &mut NoProgress).unwrap_err();
        assert!(matches!(err, crate::LedgerError::Session(SessionError::NoLedgerPath)));

        session.set_ledger_path("ledger.csv");
        let err = session.run(&CsvLedgerStore::new(), &mut NoProgress).unwrap_err();
        assert!(matches!(err, crate::LedgerError::Session(SessionError::NothingQueued)));
    }

    #[test]
    fn test_malformed_file_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let good_a = dir.path().join("a.xml");
        let bad = dir.path().join("bad.xml");
        let good_b = dir.path().join("b.xml");
        fs::write(&good_a, invoice("1", "2024-01-10", "10.00")).unwrap();
        fs::write(&bad, "<cfdi:Comprobante><broken").unwrap();
        fs::write(&good_b, invoice("2", "2024-03-01", "20.00")).unwrap();

        let mut session = session_in(dir.path());
        assert_eq!(session.queue([&good_a, &bad, &good_b]), 3);

        let mut progress = Recorder::default();
        let report = session.run(&CsvLedgerStore::new(), &mut progress).unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, bad);
        assert!(report.errors[0].is_parse_error());
        assert_eq!(report.processed, vec![good_a.clone(), good_b.clone()]);
        assert_eq!(report.table.len(), 2);
        assert_eq!(report.table.rows()[0].invoice_number, "2");
        assert_eq!(progress.calls, vec![(1, 3), (2, 3), (3, 3)]);
        assert!(matches!(report.save, SaveOutcome::Saved(_)));
        assert!(session.queued().is_empty());
        assert!(session.is_processed(&good_a));
        assert!(!session.is_processed(&bad));
    }

    #[test]
    fn test_queue_skips_duplicates_and_processed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.xml");
        fs::write(&file, invoice("1", "2024-01-10", "10.00")).unwrap();

        let mut session = session_in(dir.path());
        assert_eq!(session.queue([&file, &file]), 1);
        session.run(&CsvLedgerStore::new(), &mut NoProgress).unwrap();

        assert_eq!(session.queue([&file]), 0);
    }

    #[test]
    fn test_resubmitted_invoice_is_deduplicated_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.xml");
        let copy = dir.path().join("copy.xml");
        fs::write(&first, invoice("1", "2024-01-10", "10.00")).unwrap();
        fs::write(&copy, invoice("1", "2024-01-10", "10.00")).unwrap();

        let mut session = session_in(dir.path());
        session.queue([&first]);
        session.run(&CsvLedgerStore::new(), &mut NoProgress).unwrap();

        let mut next = session_in(dir.path());
        next.queue([&copy]);
        let report = next.run(&CsvLedgerStore::new(), &mut NoProgress).unwrap();

        assert_eq!(report.table.len(), 1);
        assert_eq!(report.table.sum_of_totals(), Decimal::new(1000, 2));
    }

    #[test]
    fn test_save_failure_keeps_aggregation() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.xml");
        fs::write(&file, invoice("1", "2024-01-10", "10.00")).unwrap();

        let mut session = session_in(dir.path());
        session.queue([&file]);
        let report = session.run(&LockedStore, &mut NoProgress).unwrap();

        assert!(report.save.is_failure());
        assert_eq!(report.table.len(), 1);
    }

    #[test]
    fn test_corrupt_ledger_aborts_before_processing() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("ledger.csv");
        fs::write(&ledger, "not,a,ledger\n").unwrap();
        let file = dir.path().join("a.xml");
        fs::write(&file, invoice("1", "2024-01-10", "10.00")).unwrap();

        let mut session = session_in(dir.path());
        session.queue([&file]);
        let err = session.run(&CsvLedgerStore::new(), &mut NoProgress).unwrap_err();

        assert!(matches!(err, crate::LedgerError::Persistence(PersistenceError::Load { .. })));
        assert_eq!(fs::read_to_string(&ledger).unwrap(), "not,a,ledger\n");
    }

    #[test]
    fn test_all_failed_skips_empty_save() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.xml");
        fs::write(&bad, "garbage").unwrap();

        let mut session = session_in(dir.path());
        session.queue([&bad]);
        let report = session.run(&CsvLedgerStore::new(), &mut NoProgress).unwrap();

        assert!(matches!(report.save, SaveOutcome::Skipped));
        assert!(!dir.path().join("ledger.csv").exists());
    }

    #[test]
    fn test_out_of_range_total_does_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let huge = dir.path().join("huge.xml");
        let small = dir.path().join("small.xml");
        fs::write(&huge, invoice("1", "2024-01-05", "79228162514264337593543950335")).unwrap();
        fs::write(&small, invoice("2", "2024-01-06", "1")).unwrap();

        let mut session = session_in(dir.path());
        session.queue([&huge, &small]);
        let report = session.run(&CsvLedgerStore::new(), &mut NoProgress).unwrap();

        assert_eq!(report.processed.len(), 2);
        assert_eq!(report.table.sum_of_totals(), Decimal::ONE);
        assert!(report.warnings.iter().any(|(p, _)| p == &huge));
        assert!(matches!(report.save, SaveOutcome::Saved(_)));
    }

    #[test]
    fn test_mixed_date_formats_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.xml");
        let b = dir.path().join("b.xml");
        fs::write(&a, invoice("1", "2024-01-05", "1")).unwrap();
        fs::write(&b, invoice("2", "05/01/2024", "1")).unwrap();

        let mut session = session_in(dir.path());
        session.queue([&a, &b]);
        let report = session.run(&CsvLedgerStore::new(), &mut NoProgress).unwrap();

        assert!(report.mixed_date_formats);
    }
}
