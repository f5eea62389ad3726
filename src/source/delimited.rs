//! Delimited text adapter (CSV, TSV, ...).

use std::fs;
use std::io::Cursor;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Terminator};

use crate::error::DataFileResult;
use crate::types::{RawRecord, Row};

use super::{DataFileFormat, RawCursor, RawRowSupplier, RowSource, count_lines, source_not_found};

/// How records are terminated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LineTerminator {
    /// `\r\n`, `\n` and a lone `\r` all end a record.
    #[default]
    Any,
    /// Only this byte ends a record.
    Byte(u8),
}

impl From<LineTerminator> for Terminator {
    fn from(t: LineTerminator) -> Self {
        match t {
            LineTerminator::Any => Terminator::CRLF,
            LineTerminator::Byte(b) => Terminator::Any(b),
        }
    }
}

/// Options for reading delimited text; scoped to one adapter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DelimitedOptions {
    /// Field separator.
    pub delimiter: u8,
    pub terminator: LineTerminator,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            terminator: LineTerminator::default(),
        }
    }
}

impl DelimitedOptions {
    /// Tab-separated defaults.
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::default()
        }
    }
}

/// Reads delimited records and maps them onto the headings by position.
///
/// The whole file is read into memory on open. The row count is the number of newline-terminated
/// lines in the file. Each empty line reads as "no data" and so uses up a row index, as do reads
/// past the last record; the engine's row count check ends the stream. Cells under empty headings
/// are left out of the row.
#[derive(Debug, Default)]
pub struct DelimitedSupplier {
    options: DelimitedOptions,
    reader: Option<csv::Reader<Cursor<Vec<u8>>>>,
    record: StringRecord,
    // empty lines still to report before the next record; `None` until scanned
    blanks_ahead: Option<usize>,
}

impl DelimitedSupplier {
    pub fn new(options: DelimitedOptions) -> Self {
        Self {
            options,
            reader: None,
            record: StringRecord::new(),
            blanks_ahead: None,
        }
    }

    /// Set the field separator.
    pub fn set_delimiter(&mut self, delimiter: u8) {
        self.options.delimiter = delimiter;
    }

    pub fn options(&self) -> DelimitedOptions {
        self.options
    }

    fn read_record(&mut self) -> DataFileResult<bool> {
        match self.reader.as_mut() {
            Some(reader) => Ok(reader.read_record(&mut self.record)?),
            None => Ok(false),
        }
    }

    /// Count the empty lines between the reader's position and the next record. The `csv` reader
    /// skips these silently.
    fn scan_blank_lines(&self) -> usize {
        let Some(reader) = self.reader.as_ref() else {
            return 0;
        };
        let bytes = reader.get_ref().get_ref();
        let Ok(mut pos) = usize::try_from(reader.position().byte()) else {
            return 0;
        };
        // a CRLF terminator is reported as soon as the `\r` is read
        if self.options.terminator == LineTerminator::Any
            && pos > 0
            && bytes.get(pos - 1) == Some(&b'\r')
            && bytes.get(pos) == Some(&b'\n')
        {
            pos += 1;
        }
        let mut blanks = 0;
        while let Some(&b) = bytes.get(pos) {
            match self.options.terminator {
                LineTerminator::Any if b == b'\r' => {
                    pos += if bytes.get(pos + 1) == Some(&b'\n') { 2 } else { 1 };
                }
                LineTerminator::Any if b == b'\n' => pos += 1,
                LineTerminator::Byte(t) if b == t => pos += 1,
                _ => break,
            }
            blanks += 1;
        }
        blanks
    }
}

impl RawRowSupplier for DelimitedSupplier {
    fn format(&self) -> DataFileFormat {
        DataFileFormat::Delimited
    }

    fn open_raw(&mut self, file_name: &Path) -> DataFileResult<usize> {
        let bytes = fs::read(file_name).map_err(|e| source_not_found(file_name, &e))?;
        let row_count = count_lines(&bytes);
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.options.delimiter)
            .terminator(self.options.terminator.into())
            .from_reader(Cursor::new(bytes));
        self.reader = Some(reader);
        Ok(row_count)
    }

    fn populate_headings(&mut self) -> DataFileResult<Vec<String>> {
        if !self.read_record()? {
            return Ok(Vec::new());
        }
        Ok(self.record.iter().map(str::to_owned).collect())
    }

    fn retrieve_next_raw(&mut self, cursor: RawCursor<'_>) -> DataFileResult<RawRecord> {
        let blanks = match self.blanks_ahead {
            Some(n) => n,
            None => self.scan_blank_lines(),
        };
        if blanks > 0 {
            self.blanks_ahead = Some(blanks - 1);
            return Ok(RawRecord::Blank);
        }
        self.blanks_ahead = None;
        if !self.read_record()? {
            return Ok(RawRecord::Blank);
        }
        let row: Row = cursor
            .headings
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(idx, h)| (h.clone(), self.record.get(idx).map(str::to_owned)))
            .collect();
        Ok(RawRecord::Row(row))
    }

    fn close_raw(&mut self) -> DataFileResult<()> {
        self.reader = None;
        self.blanks_ahead = None;
        Ok(())
    }
}

/// Create an unopened delimited source for `path`.
pub fn delimited_source(path: impl AsRef<Path>, options: DelimitedOptions) -> RowSource<DelimitedSupplier> {
    RowSource::new(path, DelimitedSupplier::new(options))
}

/// Convenience: open `path` with a header row and read every row.
pub fn load_delimited(path: impl AsRef<Path>, options: DelimitedOptions) -> DataFileResult<Vec<Row>> {
    let mut source = delimited_source(path, options);
    source.set_header_row(true);
    source.load()?;
    Ok(source.take_data_items())
}
