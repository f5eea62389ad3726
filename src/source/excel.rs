#![cfg(feature = "excel")]

//! Spreadsheet adapter (`.xlsx`, `.xls`, `.ods`, ...).

use std::fs;
use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};

use crate::error::{DataFileError, DataFileResult};
use crate::types::{RawRecord, Row};

use super::{DataFileFormat, RawCursor, RawRowSupplier, RowSource, source_not_found};

/// Which sheet of a workbook to read.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SheetSelection {
    /// The first sheet in the workbook (default).
    #[default]
    First,
    /// A single named sheet.
    Named(String),
}

/// Options for reading spreadsheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExcelOptions {
    pub sheet: SheetSelection,
}

/// Reads one worksheet, addressed by absolute row index.
///
/// Behavior:
/// - the row count is the highest used row (1-based)
/// - the header row is the first sheet row, over every used column; empty cells give empty
///   headings, and the header occupies one row index
/// - data rows skip columns under empty headings; every other cell is rendered as text
#[derive(Debug, Default)]
pub struct ExcelSupplier {
    options: ExcelOptions,
    range: Option<Range<Data>>,
    column_count: u32,
}

impl ExcelSupplier {
    pub fn new(options: ExcelOptions) -> Self {
        Self {
            options,
            range: None,
            column_count: 0,
        }
    }

    fn cell_text(&self, row: u32, col: u32) -> String {
        self.range
            .as_ref()
            .and_then(|r| r.get_value((row, col)))
            .map(cell_to_string)
            .unwrap_or_default()
    }
}

impl RawRowSupplier for ExcelSupplier {
    fn format(&self) -> DataFileFormat {
        DataFileFormat::Excel
    }

    fn open_raw(&mut self, file_name: &Path) -> DataFileResult<usize> {
        fs::metadata(file_name).map_err(|e| source_not_found(file_name, &e))?;
        let mut workbook = open_workbook_auto(file_name)?;

        let sheet = match &self.options.sheet {
            SheetSelection::Named(name) => name.clone(),
            SheetSelection::First => workbook.sheet_names().first().cloned().ok_or_else(|| {
                DataFileError::UnsupportedFormat {
                    message: format!("workbook '{}' has no sheets", file_name.display()),
                }
            })?,
        };
        let range = workbook.worksheet_range(&sheet)?;

        let (row_count, column_count) = range
            .end()
            .map_or((0, 0), |(row, col)| (row as usize + 1, col + 1));
        self.column_count = column_count;
        self.range = Some(range);
        Ok(row_count)
    }

    fn populate_headings(&mut self) -> DataFileResult<Vec<String>> {
        Ok((0..self.column_count).map(|col| self.cell_text(0, col)).collect())
    }

    fn header_rows_consumed(&self) -> usize {
        1
    }

    fn retrieve_next_raw(&mut self, cursor: RawCursor<'_>) -> DataFileResult<RawRecord> {
        let Ok(row_idx) = u32::try_from(cursor.row_index) else {
            return Ok(RawRecord::End);
        };
        let row: Row = cursor
            .headings
            .iter()
            .zip(0u32..)
            .filter(|(heading, _)| !heading.is_empty())
            .map(|(heading, col)| (heading.clone(), Some(self.cell_text(row_idx, col))))
            .collect();
        Ok(RawRecord::Row(row))
    }

    fn close_raw(&mut self) -> DataFileResult<()> {
        self.range = None;
        Ok(())
    }
}

fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{f:.0}")
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(f) => f.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}

/// Create an unopened spreadsheet source for `path`.
pub fn excel_source(path: impl AsRef<Path>, options: ExcelOptions) -> RowSource<ExcelSupplier> {
    RowSource::new(path, ExcelSupplier::new(options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_floats_render_without_fraction() {
        assert_eq!(cell_to_string(&Data::Float(3.0)), "3");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn whole_floats_beyond_i64_keep_every_digit() {
        assert_eq!(cell_to_string(&Data::Float(1e20)), "100000000000000000000");
        assert_eq!(cell_to_string(&Data::Float(-12.0)), "-12");
    }

    #[test]
    fn missing_workbook_is_source_not_found() {
        let mut source = excel_source("tests/fixtures/does_not_exist.xlsx", ExcelOptions::default());
        source.set_header_row(true);
        let err = source.open().unwrap_err();
        assert!(matches!(err, DataFileError::SourceNotFound { .. }));
    }
}
