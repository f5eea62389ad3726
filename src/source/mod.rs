//! Row sources and the adapters that feed them.
//!
//! [`RowSource`] is the row-iteration engine shared by every file type: it owns the headings,
//! the open/read/close lifecycle, blank-row suppression, trimming and the row limit. The raw
//! reading is delegated to a [`RawRowSupplier`] adapter:
//!
//! - [`delimited`]: delimited text (CSV/TSV) via the `csv` crate
//! - [`excel`]: spreadsheets via `calamine` (feature `excel`)
//! - [`field_text`]: field-text markup, one field definition per line
//! - [`memory`]: raw records held in memory
//!
//! Most callers should use [`open_from_path`] / [`load_from_path`] (from [`unified`]), which pick
//! the adapter from the file extension.

use std::fmt;
use std::path::Path;

use crate::error::DataFileResult;
use crate::types::RawRecord;

pub mod delimited;
#[cfg(feature = "excel")]
pub mod excel;
pub mod field_text;
pub mod memory;
pub mod observability;
mod row_source;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, LoadStats, RowSourceObserver, Severity, SkipReason,
    SourceContext, StdErrObserver,
};
pub use row_source::{RowSource, RowSourceOptions, Rows};
pub use unified::{DataFileFormat, OpenOptions, load_from_path, open_from_path};

/// Position and headings handed to an adapter for one raw read.
#[derive(Debug, Clone, Copy)]
pub struct RawCursor<'a> {
    /// Headings the adapter should map cells onto.
    pub headings: &'a [String],
    /// 0-based index of the row about to be read, counted by the engine.
    pub row_index: usize,
}

/// The capabilities a concrete file adapter provides to [`RowSource`].
///
/// The engine calls `open_raw` once per open (and again on reset), `populate_headings` only when
/// a header row is declared, `retrieve_next_raw` once per row index, and `close_raw` on close.
pub trait RawRowSupplier: fmt::Debug {
    /// Format reported to observers.
    fn format(&self) -> DataFileFormat;

    /// Acquire the underlying source and return its total row count.
    ///
    /// Missing sources must be reported as [`crate::DataFileError::SourceNotFound`].
    fn open_raw(&mut self, file_name: &Path) -> DataFileResult<usize>;

    /// Read the header row.
    fn populate_headings(&mut self) -> DataFileResult<Vec<String>>;

    /// How many row indexes the header row occupies in the engine's count.
    fn header_rows_consumed(&self) -> usize {
        0
    }

    /// Read the raw row at `cursor.row_index`.
    fn retrieve_next_raw(&mut self, cursor: RawCursor<'_>) -> DataFileResult<RawRecord>;

    /// Release whatever `open_raw` acquired.
    fn close_raw(&mut self) -> DataFileResult<()>;
}

impl<S: RawRowSupplier + ?Sized> RawRowSupplier for Box<S> {
    fn format(&self) -> DataFileFormat {
        (**self).format()
    }

    fn open_raw(&mut self, file_name: &Path) -> DataFileResult<usize> {
        (**self).open_raw(file_name)
    }

    fn populate_headings(&mut self) -> DataFileResult<Vec<String>> {
        (**self).populate_headings()
    }

    fn header_rows_consumed(&self) -> usize {
        (**self).header_rows_consumed()
    }

    fn retrieve_next_raw(&mut self, cursor: RawCursor<'_>) -> DataFileResult<RawRecord> {
        (**self).retrieve_next_raw(cursor)
    }

    fn close_raw(&mut self) -> DataFileResult<()> {
        (**self).close_raw()
    }
}

/// Count newline-terminated lines, the way `wc -l` does.
pub(crate) fn count_lines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\n').count()
}

/// Map an open failure to [`crate::DataFileError::SourceNotFound`].
pub(crate) fn source_not_found(path: &Path, err: &std::io::Error) -> crate::DataFileError {
    crate::DataFileError::SourceNotFound {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
