use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::DataFileError;

use super::unified::DataFileFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (missing source, I/O failure).
    Critical,
}

impl Severity {
    /// Severity an error is reported with.
    pub fn for_error(error: &DataFileError) -> Self {
        match error {
            DataFileError::Io(_) | DataFileError::SourceNotFound { .. } => Severity::Critical,
            DataFileError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => Severity::Critical,
                _ => Severity::Error,
            },
            _ => Severity::Error,
        }
    }
}

/// Why a raw row was dropped by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The row was a single empty field.
    SingleEmptyField,
    /// The adapter had no data at this position.
    NoData,
    /// At least as many empty cells as there are non-empty headings.
    StructurallyBlank,
}

/// Context about the source an event belongs to.
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// File name the source was created with.
    pub file_name: PathBuf,
    /// Format of the adapter behind the source; `None` when it could not be determined.
    pub format: Option<DataFileFormat>,
}

/// Stats reported when [`super::RowSource::load`] completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    /// Rows kept in the data items.
    pub rows: usize,
    /// Total rows the adapter reported on open.
    pub row_count: usize,
}

/// Observer interface for row source lifecycle events.
///
/// Every method has a no-op default, so implementors only override what they record.
pub trait RowSourceObserver: Send + Sync {
    /// Called after a successful open (or reset).
    fn on_open(&self, _ctx: &SourceContext, _row_count: usize) {}

    /// Called for every raw row the engine drops.
    fn on_row_skipped(&self, _ctx: &SourceContext, _row_index: usize, _reason: SkipReason) {}

    /// Called when `load` finishes.
    fn on_loaded(&self, _ctx: &SourceContext, _stats: LoadStats) {}

    /// Called when an operation fails.
    fn on_failure(&self, _ctx: &SourceContext, _severity: Severity, _error: &DataFileError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &SourceContext, severity: Severity, error: &DataFileError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn RowSourceObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn RowSourceObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl RowSourceObserver for CompositeObserver {
    fn on_open(&self, ctx: &SourceContext, row_count: usize) {
        for o in &self.observers {
            o.on_open(ctx, row_count);
        }
    }

    fn on_row_skipped(&self, ctx: &SourceContext, row_index: usize, reason: SkipReason) {
        for o in &self.observers {
            o.on_row_skipped(ctx, row_index, reason);
        }
    }

    fn on_loaded(&self, ctx: &SourceContext, stats: LoadStats) {
        for o in &self.observers {
            o.on_loaded(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &SourceContext, severity: Severity, error: &DataFileError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &SourceContext, severity: Severity, error: &DataFileError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs lifecycle events to stderr. Skipped rows are not reported.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl RowSourceObserver for StdErrObserver {
    fn on_open(&self, ctx: &SourceContext, row_count: usize) {
        eprintln!(
            "[datafile][open] format={:?} file={} row_count={}",
            ctx.format,
            ctx.file_name.display(),
            row_count
        );
    }

    fn on_loaded(&self, ctx: &SourceContext, stats: LoadStats) {
        eprintln!(
            "[datafile][ok] format={:?} file={} rows={} row_count={}",
            ctx.format,
            ctx.file_name.display(),
            stats.rows,
            stats.row_count
        );
    }

    fn on_failure(&self, ctx: &SourceContext, severity: Severity, error: &DataFileError) {
        eprintln!(
            "[datafile][{:?}] format={:?} file={} err={}",
            severity,
            ctx.format,
            ctx.file_name.display(),
            error
        );
    }

    fn on_alert(&self, ctx: &SourceContext, severity: Severity, error: &DataFileError) {
        eprintln!(
            "[ALERT][datafile][{:?}] format={:?} file={} err={}",
            severity,
            ctx.format,
            ctx.file_name.display(),
            error
        );
    }
}

/// Appends lifecycle events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl RowSourceObserver for FileObserver {
    fn on_open(&self, ctx: &SourceContext, row_count: usize) {
        self.append_line(&format!(
            "{} open format={:?} file={} row_count={}",
            unix_ts(),
            ctx.format,
            ctx.file_name.display(),
            row_count
        ));
    }

    fn on_row_skipped(&self, ctx: &SourceContext, row_index: usize, reason: SkipReason) {
        self.append_line(&format!(
            "{} skip format={:?} file={} row={} reason={:?}",
            unix_ts(),
            ctx.format,
            ctx.file_name.display(),
            row_index,
            reason
        ));
    }

    fn on_loaded(&self, ctx: &SourceContext, stats: LoadStats) {
        self.append_line(&format!(
            "{} ok format={:?} file={} rows={} row_count={}",
            unix_ts(),
            ctx.format,
            ctx.file_name.display(),
            stats.rows,
            stats.row_count
        ));
    }

    fn on_failure(&self, ctx: &SourceContext, severity: Severity, error: &DataFileError) {
        self.append_line(&format!(
            "{} fail severity={:?} format={:?} file={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.file_name.display(),
            error
        ));
    }

    fn on_alert(&self, ctx: &SourceContext, severity: Severity, error: &DataFileError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} format={:?} file={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.file_name.display(),
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source_is_critical() {
        let err = DataFileError::SourceNotFound {
            path: "x.csv".to_string(),
            message: "No such file".to_string(),
        };
        assert_eq!(Severity::for_error(&err), Severity::Critical);
    }

    #[test]
    fn validation_errors_are_plain_errors() {
        let err = DataFileError::InvalidBatchSize { size: 0 };
        assert_eq!(Severity::for_error(&err), Severity::Error);
        let err = DataFileError::HeadingsNotDefined {
            file: "x.csv".to_string(),
        };
        assert_eq!(Severity::for_error(&err), Severity::Error);
    }

    #[test]
    fn file_observer_appends_one_line_per_event() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("datafile-observer-{nanos}.log"));
        let _ = std::fs::remove_file(&path);
        let obs = FileObserver::new(&path);
        let ctx = SourceContext {
            file_name: PathBuf::from("forms.ftx"),
            format: Some(DataFileFormat::FieldText),
        };
        obs.on_open(&ctx, 3);
        obs.on_row_skipped(&ctx, 1, SkipReason::NoData);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("open format=Some(FieldText) file=forms.ftx row_count=3"));
        assert!(lines[1].contains("reason=NoData"));
        let _ = std::fs::remove_file(&path);
    }
}
