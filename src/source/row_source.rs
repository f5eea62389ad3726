use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::error::{DataFileError, DataFileResult};
use crate::types::{RawRecord, Row};

use super::observability::{LoadStats, RowSourceObserver, Severity, SkipReason, SourceContext};
use super::{RawCursor, RawRowSupplier};

/// Options controlling how a [`RowSource`] treats headings and rows.
///
/// Use [`Default`] for common cases.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RowSourceOptions {
    /// The first raw row holds the headings.
    pub has_header_row: bool,
    /// Stop after this many row indexes have been consumed.
    pub limit: Option<usize>,
    /// Trim surrounding whitespace from every emitted value.
    pub trim_fields: bool,
    /// Blank headings are exempt from the duplicate check.
    pub ignore_empty_headings: bool,
}

/// Row-iteration engine shared by every file type.
///
/// Lifecycle: unopened → [`open`](Self::open) → [`next_row`](Self::next_row) until it returns
/// `None` → [`close`](Self::close). [`reset`](Self::reset) reopens from the start. Callers are
/// responsible for calling `close` on every exit path once `open` has succeeded
/// ([`load`](Self::load) does this itself).
///
/// Rows the adapter reports as blank, rows made of a single empty field, and rows with at least
/// as many empty cells as there are non-empty headings are skipped; they still consume a row
/// index.
pub struct RowSource<S> {
    supplier: S,
    file_name: PathBuf,
    headings: Option<Vec<String>>,
    options: RowSourceOptions,
    row_count: usize,
    current_row: usize,
    non_empty_heading_count: usize,
    opened: bool,
    data_items: Vec<Row>,
    observer: Option<Arc<dyn RowSourceObserver>>,
    alert_at_or_above: Severity,
}

impl<S: fmt::Debug> fmt::Debug for RowSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowSource")
            .field("supplier", &self.supplier)
            .field("file_name", &self.file_name)
            .field("headings", &self.headings)
            .field("options", &self.options)
            .field("row_count", &self.row_count)
            .field("current_row", &self.current_row)
            .field("opened", &self.opened)
            .field("data_items_len", &self.data_items.len())
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl<S: RawRowSupplier> RowSource<S> {
    /// Create an unopened source over `supplier`, with no preset headings.
    pub fn new(file_name: impl AsRef<Path>, supplier: S) -> Self {
        Self {
            supplier,
            file_name: file_name.as_ref().to_path_buf(),
            headings: None,
            options: RowSourceOptions::default(),
            row_count: 0,
            current_row: 0,
            non_empty_heading_count: 0,
            opened: false,
            data_items: Vec::new(),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }

    /// Create an unopened source with preset headings.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::DuplicateHeading`] if two non-empty headings collide.
    pub fn with_headings<H>(file_name: impl AsRef<Path>, supplier: S, headings: H) -> DataFileResult<Self>
    where
        H: IntoIterator,
        H::Item: Into<String>,
    {
        let mut source = Self::new(file_name, supplier);
        source.set_headings(headings)?;
        Ok(source)
    }

    /// Replace all options at once.
    pub fn with_options(mut self, options: RowSourceOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach an observer; failures at or above `alert_at_or_above` are also sent to `on_alert`.
    pub fn with_observer(mut self, observer: Arc<dyn RowSourceObserver>, alert_at_or_above: Severity) -> Self {
        self.observer = Some(observer);
        self.alert_at_or_above = alert_at_or_above;
        self
    }

    /// Set the headings matching the columns.
    ///
    /// Headings are replaced only if no two non-empty headings collide; with
    /// `ignore_empty_headings` set, blank headings are left out of the check entirely.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::DuplicateHeading`] naming the first repeated heading.
    pub fn set_headings<H>(&mut self, headings: H) -> DataFileResult<()>
    where
        H: IntoIterator,
        H::Item: Into<String>,
    {
        let headings: Vec<String> = headings.into_iter().map(Into::into).collect();
        let mut unique = HashSet::with_capacity(headings.len());
        for heading in &headings {
            if self.options.ignore_empty_headings && heading.is_empty() {
                continue;
            }
            if !unique.insert(heading.as_str()) {
                return Err(DataFileError::DuplicateHeading {
                    heading: heading.clone(),
                    file: self.file_name.display().to_string(),
                });
            }
        }
        self.headings = Some(headings);
        Ok(())
    }

    /// Current headings, `None` until set or read from a header row.
    pub fn headings(&self) -> Option<&[String]> {
        self.headings.as_deref()
    }

    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    pub fn set_file_name(&mut self, file_name: impl AsRef<Path>) {
        self.file_name = file_name.as_ref().to_path_buf();
    }

    pub fn options(&self) -> &RowSourceOptions {
        &self.options
    }

    pub fn has_header_row(&self) -> bool {
        self.options.has_header_row
    }

    pub fn set_header_row(&mut self, has_header_row: bool) {
        self.options.has_header_row = has_header_row;
    }

    pub fn limit(&self) -> Option<usize> {
        self.options.limit
    }

    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.options.limit = limit;
    }

    pub fn trim_fields(&self) -> bool {
        self.options.trim_fields
    }

    pub fn set_trim_fields(&mut self, trim_fields: bool) {
        self.options.trim_fields = trim_fields;
    }

    pub fn ignore_empty_headings(&self) -> bool {
        self.options.ignore_empty_headings
    }

    pub fn set_ignore_empty_headings(&mut self, ignore: bool) {
        self.options.ignore_empty_headings = ignore;
    }

    /// Total rows reported by the adapter on open (0 before open).
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Headings with non-empty text, as counted on the last open.
    pub fn non_empty_heading_count(&self) -> usize {
        self.non_empty_heading_count
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// Rows collected by [`load`](Self::load).
    pub fn data_items(&self) -> &[Row] {
        &self.data_items
    }

    pub fn set_data_items(&mut self, data_items: Vec<Row>) {
        self.data_items = data_items;
    }

    /// Take the collected rows, leaving the data items empty.
    pub fn take_data_items(&mut self) -> Vec<Row> {
        std::mem::take(&mut self.data_items)
    }

    pub fn supplier(&self) -> &S {
        &self.supplier
    }

    /// Open the adapter and set up headings.
    ///
    /// # Errors
    ///
    /// - whatever the adapter's `open_raw` reports (e.g. [`DataFileError::SourceNotFound`])
    /// - [`DataFileError::HeadingsNotDefined`] if there is no header row and no preset headings
    /// - [`DataFileError::DuplicateHeading`] if the header row repeats a heading
    pub fn open(&mut self) -> DataFileResult<()> {
        let result = self.open_inner();
        self.observe(result)
    }

    fn open_inner(&mut self) -> DataFileResult<()> {
        self.row_count = self.supplier.open_raw(&self.file_name)?;

        if !self.options.has_header_row && self.headings.is_none() {
            return Err(DataFileError::HeadingsNotDefined {
                file: self.file_name.display().to_string(),
            });
        }
        if self.options.has_header_row {
            let headings = self.supplier.populate_headings()?;
            self.set_headings(headings)?;
            self.current_row += self.supplier.header_rows_consumed();
        }
        self.update_non_empty_heading_count();
        self.opened = true;

        debug!(
            "opened '{}': row_count={} headings={:?}",
            self.file_name.display(),
            self.row_count,
            self.headings
        );
        if let Some(obs) = self.observer.as_ref() {
            obs.on_open(&self.context(), self.row_count);
        }
        Ok(())
    }

    fn update_non_empty_heading_count(&mut self) {
        self.non_empty_heading_count = self
            .headings
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|h| !h.is_empty())
            .count();
    }

    /// Read the next non-blank row, or `None` at end of stream.
    ///
    /// End of stream is reached when the row limit is hit (`index >= limit`), when the index
    /// passes the total row count (`index > row_count`, which allows one read past the nominal
    /// count), or when the adapter reports it is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::FileNotOpened`] if called before a successful [`open`](Self::open).
    pub fn next_row(&mut self) -> DataFileResult<Option<Row>> {
        let result = self.next_row_inner();
        self.observe(result)
    }

    fn next_row_inner(&mut self) -> DataFileResult<Option<Row>> {
        if !self.opened {
            return Err(DataFileError::FileNotOpened {
                file: self.file_name.display().to_string(),
            });
        }

        loop {
            if self.is_last_row() {
                return Ok(None);
            }
            let cursor = RawCursor {
                headings: self.headings.as_deref().unwrap_or_default(),
                row_index: self.current_row,
            };
            let record = self.supplier.retrieve_next_raw(cursor)?;
            let row_index = self.current_row;
            self.current_row += 1;

            let row = match record {
                RawRecord::End => return Ok(None),
                RawRecord::Blank => {
                    self.skipped(row_index, SkipReason::NoData);
                    continue;
                }
                RawRecord::Row(row) => row,
            };
            if row.is_single_empty_field() {
                self.skipped(row_index, SkipReason::SingleEmptyField);
                continue;
            }
            if row.empty_cell_count() >= self.non_empty_heading_count {
                self.skipped(row_index, SkipReason::StructurallyBlank);
                continue;
            }

            return Ok(Some(if self.options.trim_fields {
                row.trimmed()
            } else {
                row
            }));
        }
    }

    fn is_last_row(&self) -> bool {
        if self.options.limit.is_some_and(|limit| self.current_row >= limit) {
            return true;
        }
        self.current_row > self.row_count
    }

    fn skipped(&self, row_index: usize, reason: SkipReason) {
        trace!(
            "skipping row {} of '{}': {:?}",
            row_index,
            self.file_name.display(),
            reason
        );
        if let Some(obs) = self.observer.as_ref() {
            obs.on_row_skipped(&self.context(), row_index, reason);
        }
    }

    /// Iterate the remaining rows; the iterator stops after the first error.
    pub fn rows(&mut self) -> Rows<'_, S> {
        Rows {
            source: self,
            done: false,
        }
    }

    /// Open the source, collect every remaining row into the data items, then close it.
    ///
    /// If reading fails after a successful open, the source is still closed before the read
    /// error is returned.
    pub fn load(&mut self) -> DataFileResult<()> {
        self.open()?;

        let collected = loop {
            match self.next_row() {
                Ok(Some(row)) => self.data_items.push(row),
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        let closed = self.close();
        collected?;
        closed?;

        if let Some(obs) = self.observer.as_ref() {
            let stats = LoadStats {
                rows: self.data_items.len(),
                row_count: self.row_count,
            };
            obs.on_loaded(&self.context(), stats);
        }
        Ok(())
    }

    /// Release the adapter's resources. Further reads fail until the source is reopened.
    pub fn close(&mut self) -> DataFileResult<()> {
        self.opened = false;
        debug!("closing '{}'", self.file_name.display());
        let result = self.supplier.close_raw();
        self.observe(result)
    }

    /// Reopen the source so reading starts from the beginning again.
    pub fn reset(&mut self) -> DataFileResult<()> {
        debug!("resetting '{}'", self.file_name.display());
        self.row_count = 0;
        self.current_row = 0;
        self.open()
    }

    /// Erase the adapter type, keeping headings, options, observer and read state.
    pub fn boxed(self) -> RowSource<Box<dyn RawRowSupplier>>
    where
        S: 'static,
    {
        RowSource {
            supplier: Box::new(self.supplier),
            file_name: self.file_name,
            headings: self.headings,
            options: self.options,
            row_count: self.row_count,
            current_row: self.current_row,
            non_empty_heading_count: self.non_empty_heading_count,
            opened: self.opened,
            data_items: self.data_items,
            observer: self.observer,
            alert_at_or_above: self.alert_at_or_above,
        }
    }

    fn context(&self) -> SourceContext {
        SourceContext {
            file_name: self.file_name.clone(),
            format: Some(self.supplier.format()),
        }
    }

    fn observe<T>(&self, result: DataFileResult<T>) -> DataFileResult<T> {
        if let Err(e) = &result {
            warn!("'{}': {}", self.file_name.display(), e);
        }
        if let (Err(e), Some(obs)) = (&result, self.observer.as_ref()) {
            let ctx = self.context();
            let severity = Severity::for_error(e);
            obs.on_failure(&ctx, severity, e);
            if severity >= self.alert_at_or_above {
                obs.on_alert(&ctx, severity, e);
            }
        }
        result
    }
}

/// Iterator over the remaining rows of a [`RowSource`], created by [`RowSource::rows`].
pub struct Rows<'a, S> {
    source: &'a mut RowSource<S>,
    done: bool,
}

impl<S: RawRowSupplier> Iterator for Rows<'_, S> {
    type Item = DataFileResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.source.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::MemorySupplier;

    fn headings() -> Vec<&'static str> {
        vec!["field1", "field2", "field3"]
    }

    #[test]
    fn empty_headings_do_not_count_towards_blank_detection() {
        let supplier = MemorySupplier::new(vec![Some(vec!["", "x", ""])]);
        let mut source = RowSource::new("mem", supplier);
        source.set_ignore_empty_headings(true);
        source.set_headings(["", "a", ""]).unwrap();
        source.open().unwrap();
        assert_eq!(source.non_empty_heading_count(), 1);
        // two empty cells >= one non-empty heading
        assert_eq!(source.next_row().unwrap(), None);
    }

    #[test]
    fn reopening_recounts_non_empty_headings() {
        let supplier = MemorySupplier::new(vec![Some(vec!["a", "b", "c"])]);
        let mut source = RowSource::with_headings("mem", supplier, headings()).unwrap();
        source.open().unwrap();
        source.reset().unwrap();
        assert_eq!(source.non_empty_heading_count(), 3);
    }

    #[test]
    fn failed_duplicate_check_keeps_previous_headings() {
        let mut source = RowSource::with_headings("mem", MemorySupplier::default(), headings()).unwrap();
        let err = source.set_headings(["a", "a"]).unwrap_err();
        assert!(matches!(err, DataFileError::DuplicateHeading { ref heading, .. } if heading == "a"));
        assert_eq!(source.headings().unwrap(), ["field1", "field2", "field3"]);
    }

    #[test]
    fn rows_iterator_stops_at_end_of_stream() {
        let supplier = MemorySupplier::new(vec![Some(vec!["r1"]), None, Some(vec!["r2"])]);
        let mut source = RowSource::with_headings("mem", supplier, headings()).unwrap();
        source.open().unwrap();
        let rows: Vec<Row> = source.rows().collect::<DataFileResult<_>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("field1"), Some("r2"));
    }

    #[test]
    fn close_requires_reopen_before_reading() {
        let supplier = MemorySupplier::new(vec![Some(vec!["r1"])]);
        let mut source = RowSource::with_headings("mem", supplier, headings()).unwrap();
        source.open().unwrap();
        source.close().unwrap();
        assert!(matches!(source.next_row(), Err(DataFileError::FileNotOpened { .. })));
    }
}
