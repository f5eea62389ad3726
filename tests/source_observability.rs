use std::sync::{Arc, Mutex};

use datafile::DataFileError;
use datafile::source::memory::MemorySupplier;
use datafile::source::{
    CompositeObserver, DataFileFormat, LoadStats, OpenOptions, RowSource, RowSourceObserver, Severity,
    SkipReason, SourceContext, load_from_path,
};

#[derive(Default)]
struct RecordingObserver {
    opens: Mutex<Vec<usize>>,
    skips: Mutex<Vec<(usize, SkipReason)>>,
    loads: Mutex<Vec<LoadStats>>,
    failures: Mutex<Vec<(Option<DataFileFormat>, Severity)>>,
    alerts: Mutex<Vec<Severity>>,
}

impl RowSourceObserver for RecordingObserver {
    fn on_open(&self, _ctx: &SourceContext, row_count: usize) {
        self.opens.lock().unwrap().push(row_count);
    }

    fn on_row_skipped(&self, _ctx: &SourceContext, row_index: usize, reason: SkipReason) {
        self.skips.lock().unwrap().push((row_index, reason));
    }

    fn on_loaded(&self, _ctx: &SourceContext, stats: LoadStats) {
        self.loads.lock().unwrap().push(stats);
    }

    fn on_failure(&self, ctx: &SourceContext, severity: Severity, _error: &DataFileError) {
        self.failures.lock().unwrap().push((ctx.format, severity));
    }

    fn on_alert(&self, _ctx: &SourceContext, severity: Severity, _error: &DataFileError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn options_with(obs: &Arc<RecordingObserver>, alert_at_or_above: Severity) -> OpenOptions {
    OpenOptions {
        observer: Some(obs.clone()),
        alert_at_or_above,
        ..Default::default()
    }
}

#[test]
fn load_reports_open_skips_and_stats() {
    let obs = Arc::new(RecordingObserver::default());
    let supplier = MemorySupplier::new(vec![
        Some(vec!["a", "b"]),
        Some(vec![""]),
        None,
        Some(vec!["", ""]),
        Some(vec!["c", "d"]),
    ]);
    let mut source = RowSource::with_headings("memory", supplier, ["x", "y"])
        .unwrap()
        .with_observer(obs.clone(), Severity::Critical);
    source.load().unwrap();

    assert_eq!(*obs.opens.lock().unwrap(), [5]);
    assert_eq!(
        *obs.skips.lock().unwrap(),
        [
            (1, SkipReason::SingleEmptyField),
            (2, SkipReason::NoData),
            (3, SkipReason::StructurallyBlank),
        ]
    );
    assert_eq!(*obs.loads.lock().unwrap(), [LoadStats { rows: 2, row_count: 5 }]);
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn missing_file_is_critical_and_alerts() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options_with(&obs, Severity::Critical);

    let _ = load_from_path("tests/fixtures/does_not_exist.csv", &opts).unwrap_err();

    assert_eq!(
        *obs.failures.lock().unwrap(),
        [(Some(DataFileFormat::Delimited), Severity::Critical)]
    );
    assert_eq!(*obs.alerts.lock().unwrap(), [Severity::Critical]);
}

#[test]
fn parse_failure_is_an_error_without_alert() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options_with(&obs, Severity::Critical);

    let _ = load_from_path("tests/fixtures/overlong.ftx", &opts).unwrap_err();

    assert_eq!(
        *obs.failures.lock().unwrap(),
        [(Some(DataFileFormat::FieldText), Severity::Error)]
    );
    assert!(obs.alerts.lock().unwrap().is_empty());
    assert_eq!(*obs.opens.lock().unwrap(), [2]);
}

#[test]
fn unknown_extension_is_reported_without_a_format() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options_with(&obs, Severity::Error);

    let err = load_from_path("tests/fixtures/data.parquet", &opts).unwrap_err();

    assert!(matches!(err, DataFileError::UnsupportedFormat { .. }));
    assert_eq!(*obs.failures.lock().unwrap(), [(None::<DataFileFormat>, Severity::Error)]);
    assert_eq!(*obs.alerts.lock().unwrap(), [Severity::Error]);
}

#[test]
fn composite_observer_fans_out() {
    let a = Arc::new(RecordingObserver::default());
    let b = Arc::new(RecordingObserver::default());
    let composite = Arc::new(CompositeObserver::new(vec![a.clone() as Arc<dyn RowSourceObserver>, b.clone()]));
    let opts = OpenOptions {
        observer: Some(composite),
        ..Default::default()
    };

    let rows = load_from_path("tests/fixtures/mrc_grade.csv", &opts).unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(*a.opens.lock().unwrap(), [6]);
    assert_eq!(*b.opens.lock().unwrap(), [6]);
}
