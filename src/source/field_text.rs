//! Field-text adapter: each non-blank line becomes one field-definition row.

use std::fs;
use std::io::{BufRead, Cursor};
use std::path::Path;

use crate::error::DataFileResult;
use crate::field_text::{FIELD_TEXT_HEADINGS, parse_field_line};
use crate::types::RawRecord;

use super::{DataFileFormat, RawCursor, RawRowSupplier, RowSource, RowSourceOptions, count_lines, source_not_found};

/// Reads a field-text file line by line.
///
/// Blank lines read as "no data"; every other line goes through
/// [`parse_field_line`](crate::field_text::parse_field_line) and comes back keyed by
/// [`FIELD_TEXT_HEADINGS`]. End of file ends the stream.
#[derive(Debug, Default)]
pub struct FieldTextSupplier {
    reader: Option<Cursor<Vec<u8>>>,
    line: String,
}

impl FieldTextSupplier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RawRowSupplier for FieldTextSupplier {
    fn format(&self) -> DataFileFormat {
        DataFileFormat::FieldText
    }

    fn open_raw(&mut self, file_name: &Path) -> DataFileResult<usize> {
        let bytes = fs::read(file_name).map_err(|e| source_not_found(file_name, &e))?;
        let row_count = count_lines(&bytes);
        self.reader = Some(Cursor::new(bytes));
        Ok(row_count)
    }

    fn populate_headings(&mut self) -> DataFileResult<Vec<String>> {
        Ok(FIELD_TEXT_HEADINGS.iter().map(|h| h.to_string()).collect())
    }

    fn retrieve_next_raw(&mut self, _cursor: RawCursor<'_>) -> DataFileResult<RawRecord> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(RawRecord::End);
        };
        self.line.clear();
        if reader.read_line(&mut self.line)? == 0 {
            return Ok(RawRecord::End);
        }
        let line = self.line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return Ok(RawRecord::Blank);
        }
        Ok(RawRecord::Row(parse_field_line(line)?.to_row()))
    }

    fn close_raw(&mut self) -> DataFileResult<()> {
        self.reader = None;
        Ok(())
    }
}

/// Create an unopened field-text source for `path`, with the field-text headings preset.
///
/// `options` apply as given, except that there is never a header row and blank headings are
/// always exempt from the duplicate check.
pub fn field_text_source(
    path: impl AsRef<Path>,
    options: RowSourceOptions,
) -> DataFileResult<RowSource<FieldTextSupplier>> {
    let mut source = RowSource::new(path, FieldTextSupplier::new()).with_options(RowSourceOptions {
        has_header_row: false,
        ignore_empty_headings: true,
        ..options
    });
    source.set_headings(FIELD_TEXT_HEADINGS)?;
    Ok(source)
}
