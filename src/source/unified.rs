//! Unified entrypoint.
//!
//! Most callers should use [`open_from_path`] or [`load_from_path`], which build the right adapter
//! for a file and hand back a ready [`RowSource`].
//!
//! - If [`OpenOptions::format`] is `None`, the format is inferred from the file extension.
//! - If an observer is provided, lifecycle events, failures and alerts are reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{DataFileError, DataFileResult};
use crate::types::Row;

use super::delimited::{DelimitedOptions, DelimitedSupplier};
use super::field_text::field_text_source;
use super::observability::{RowSourceObserver, Severity, SourceContext};
use super::{RawRowSupplier, RowSource, RowSourceOptions};

#[cfg(feature = "excel")]
use super::excel::{ExcelOptions, ExcelSupplier};

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DataFileFormat {
    /// Delimited text (CSV, TSV, ...).
    Delimited,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
    /// Field-text markup, one field definition per line.
    FieldText,
    /// Raw records held in memory. Never inferred from a path.
    Memory,
}

impl DataFileFormat {
    /// Parse a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Some(Self::Delimited),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            "ftx" => Some(Self::FieldText),
            _ => None,
        }
    }
}

/// Options controlling [`open_from_path`] and [`load_from_path`].
///
/// Use [`Default`] for common cases. With the default options a delimited file or spreadsheet is
/// read with a header row; field-text files always use their fixed headings.
#[derive(Clone)]
pub struct OpenOptions {
    /// If `None`, infer the format from the file extension.
    pub format: Option<DataFileFormat>,
    /// Engine options applied to the created source.
    pub row_source: RowSourceOptions,
    /// Delimited-text options. A `.tsv` extension switches the delimiter to a tab.
    pub delimited: DelimitedOptions,
    /// Spreadsheet options.
    #[cfg(feature = "excel")]
    pub excel: ExcelOptions,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn RowSourceObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("OpenOptions");
        s.field("format", &self.format)
            .field("row_source", &self.row_source)
            .field("delimited", &self.delimited);
        #[cfg(feature = "excel")]
        s.field("excel", &self.excel);
        s.field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            format: None,
            row_source: RowSourceOptions {
                has_header_row: true,
                ..RowSourceOptions::default()
            },
            delimited: DelimitedOptions::default(),
            #[cfg(feature = "excel")]
            excel: ExcelOptions::default(),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// A source over whichever adapter the format called for.
pub type DynRowSource = RowSource<Box<dyn RawRowSupplier>>;

/// Build the adapter for `path`, apply `options` and open the source.
///
/// The caller owns the returned source and must [`close`](RowSource::close) it.
///
/// # Examples
///
/// ```no_run
/// use datafile::source::{open_from_path, OpenOptions};
///
/// # fn main() -> Result<(), datafile::DataFileError> {
/// let mut source = open_from_path("grades.csv", &OpenOptions::default())?;
/// while let Some(row) = source.next_row()? {
///     println!("{:?}", row.get("name"));
/// }
/// source.close()?;
/// # Ok(())
/// # }
/// ```
///
/// Forcing a format and reporting to stderr:
///
/// ```no_run
/// use std::sync::Arc;
///
/// use datafile::source::{open_from_path, DataFileFormat, OpenOptions, Severity, StdErrObserver};
///
/// # fn main() -> Result<(), datafile::DataFileError> {
/// let opts = OpenOptions {
///     format: Some(DataFileFormat::FieldText),
///     observer: Some(Arc::new(StdErrObserver)),
///     alert_at_or_above: Severity::Error,
///     ..Default::default()
/// };
/// let source = open_from_path("questions.txt", &opts)?;
/// println!("row_count={}", source.row_count());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// - [`DataFileError::UnsupportedFormat`] if the format cannot be inferred, or names a format
///   that cannot be opened from a path
/// - whatever [`RowSource::open`] reports
pub fn open_from_path(path: impl AsRef<Path>, options: &OpenOptions) -> DataFileResult<DynRowSource> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path).inspect_err(|e| report_failure(path, None, options, e))?,
    };

    let mut source =
        build_source(path, format, options).inspect_err(|e| report_failure(path, Some(format), options, e))?;
    if let Some(obs) = options.observer.as_ref() {
        source = source.with_observer(Arc::clone(obs), options.alert_at_or_above);
    }
    source.open()?;
    Ok(source)
}

/// Open `path` like [`open_from_path`], read every row and close it.
///
/// ```no_run
/// use datafile::source::{load_from_path, OpenOptions};
///
/// # fn main() -> Result<(), datafile::DataFileError> {
/// let rows = load_from_path("survey.xlsx", &OpenOptions::default())?;
/// println!("rows={}", rows.len());
/// # Ok(())
/// # }
/// ```
pub fn load_from_path(path: impl AsRef<Path>, options: &OpenOptions) -> DataFileResult<Vec<Row>> {
    let mut source = open_from_path(path, options)?;
    let collected: DataFileResult<Vec<Row>> = source.rows().collect();
    let closed = source.close();
    let rows = collected?;
    closed?;
    Ok(rows)
}

fn build_source(path: &Path, format: DataFileFormat, options: &OpenOptions) -> DataFileResult<DynRowSource> {
    let supplier: Box<dyn RawRowSupplier> = match format {
        DataFileFormat::Delimited => {
            let mut delimited = options.delimited;
            if has_extension(path, "tsv") {
                delimited.delimiter = b'\t';
            }
            Box::new(DelimitedSupplier::new(delimited))
        }
        DataFileFormat::Excel => excel_supplier(options)?,
        DataFileFormat::FieldText => {
            return Ok(field_text_source(path, options.row_source.clone())?.boxed());
        }
        DataFileFormat::Memory => {
            return Err(DataFileError::UnsupportedFormat {
                message: format!("in-memory sources cannot be opened from a path ({})", path.display()),
            });
        }
    };
    Ok(RowSource::new(path, supplier).with_options(options.row_source.clone()))
}

#[cfg(feature = "excel")]
fn excel_supplier(options: &OpenOptions) -> DataFileResult<Box<dyn RawRowSupplier>> {
    Ok(Box::new(ExcelSupplier::new(options.excel.clone())))
}

#[cfg(not(feature = "excel"))]
fn excel_supplier(_options: &OpenOptions) -> DataFileResult<Box<dyn RawRowSupplier>> {
    Err(DataFileError::UnsupportedFormat {
        message: "excel support not enabled (enable cargo feature 'excel')".to_string(),
    })
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case(ext))
}

fn infer_format_from_path(path: &Path) -> DataFileResult<DataFileFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| DataFileError::UnsupportedFormat {
            message: format!("cannot infer format: path has no extension ({})", path.display()),
        })?;

    DataFileFormat::from_extension(ext).ok_or_else(|| DataFileError::UnsupportedFormat {
        message: format!("cannot infer format from extension '{ext}' for path ({})", path.display()),
    })
}

// Failures before a source exists never reach the source's own observer hook.
fn report_failure(path: &Path, format: Option<DataFileFormat>, options: &OpenOptions, error: &DataFileError) {
    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    let ctx = SourceContext {
        file_name: path.to_path_buf(),
        format,
    };
    let severity = Severity::for_error(error);
    obs.on_failure(&ctx, severity, error);
    if severity >= options.alert_at_or_above {
        obs.on_alert(&ctx, severity, error);
    }
}
