//! In-memory adapter: raw records supplied up front.
//!
//! Useful for data that was already materialised elsewhere, and for exercising the engine
//! without touching the file system.

use std::path::Path;

use crate::error::DataFileResult;
use crate::types::{RawRecord, Row};

use super::{DataFileFormat, RawCursor, RawRowSupplier};

/// Raw records indexed by row position.
///
/// `None` records read as "no data". A record's values are paired with the headings by position;
/// a record shorter than the headings simply has fewer cells.
#[derive(Debug, Clone, Default)]
pub struct MemorySupplier {
    records: Vec<Option<Vec<String>>>,
    row_count: Option<usize>,
    header: Vec<String>,
    open_count: usize,
    close_count: usize,
}

impl MemorySupplier {
    /// Create a supplier whose row count is the number of records.
    pub fn new<R, V>(records: impl IntoIterator<Item = Option<R>>) -> Self
    where
        R: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            records: records
                .into_iter()
                .map(|r| r.map(|values| values.into_iter().map(Into::into).collect()))
                .collect(),
            ..Self::default()
        }
    }

    /// Report `row_count` on open instead of the number of records.
    pub fn with_row_count(mut self, row_count: usize) -> Self {
        self.row_count = Some(row_count);
        self
    }

    /// Headings returned when the source declares a header row.
    pub fn with_header<H: Into<String>>(mut self, header: impl IntoIterator<Item = H>) -> Self {
        self.header = header.into_iter().map(Into::into).collect();
        self
    }

    /// Number of times the source has been opened.
    pub fn open_count(&self) -> usize {
        self.open_count
    }

    /// Number of times the source has been closed.
    pub fn close_count(&self) -> usize {
        self.close_count
    }
}

impl RawRowSupplier for MemorySupplier {
    fn format(&self) -> DataFileFormat {
        DataFileFormat::Memory
    }

    fn open_raw(&mut self, _file_name: &Path) -> DataFileResult<usize> {
        self.open_count += 1;
        Ok(self.row_count.unwrap_or(self.records.len()))
    }

    fn populate_headings(&mut self) -> DataFileResult<Vec<String>> {
        Ok(self.header.clone())
    }

    fn retrieve_next_raw(&mut self, cursor: RawCursor<'_>) -> DataFileResult<RawRecord> {
        let record = match self.records.get(cursor.row_index) {
            None => RawRecord::End,
            Some(None) => RawRecord::Blank,
            Some(Some(values)) => RawRecord::Row(
                cursor
                    .headings
                    .iter()
                    .zip(values)
                    .map(|(h, v)| (h.clone(), Some(v.clone())))
                    .collect::<Row>(),
            ),
        };
        Ok(record)
    }

    fn close_raw(&mut self) -> DataFileResult<()> {
        self.close_count += 1;
        Ok(())
    }
}
