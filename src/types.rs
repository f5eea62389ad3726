//! Core data model types shared by row sources, adapters and the batch reader.
//!
//! A [`Row`] maps headings to cell values in heading order. Adapters hand rows to the
//! [`crate::source::RowSource`] engine wrapped in a [`RawRecord`], which also carries the
//! "no data here" and "end of stream" signals.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single row: heading → cell value, in heading order.
///
/// A cell is `None` when the source had no value for that heading at all (e.g. a short delimited
/// record), and `Some("")` when the value was present but empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, Option<String>)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row with room for `capacity` cells.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    /// Map `values` onto `headings` by position.
    ///
    /// Headings without a matching value get a `None` cell; surplus values are dropped.
    pub fn from_values<H, V>(headings: &[H], values: &[V]) -> Self
    where
        H: AsRef<str>,
        V: AsRef<str>,
    {
        headings
            .iter()
            .enumerate()
            .map(|(idx, heading)| {
                (
                    heading.as_ref().to_owned(),
                    values.get(idx).map(|v| v.as_ref().to_owned()),
                )
            })
            .collect()
    }

    /// Append a cell.
    pub fn push(&mut self, heading: impl Into<String>, value: Option<String>) {
        self.cells.push((heading.into(), value));
    }

    /// Look up the value stored under `heading`.
    ///
    /// Returns `None` both for a missing heading and for a cell without a value.
    pub fn get(&self, heading: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == heading)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Returns `true` if the row has a cell for `heading` (with or without a value).
    pub fn contains_heading(&self, heading: &str) -> bool {
        self.cells.iter().any(|(h, _)| h == heading)
    }

    /// Iterate `(heading, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v.as_deref()))
    }

    /// Iterate headings in order.
    pub fn headings(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    /// Iterate values in order.
    pub fn values(&self) -> impl Iterator<Item = Option<&str>> {
        self.cells.iter().map(|(_, v)| v.as_deref())
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells that are absent or hold an empty string.
    pub fn empty_cell_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|(_, v)| v.as_deref().is_none_or(str::is_empty))
            .count()
    }

    /// Returns `true` for a row made of exactly one empty-string cell.
    pub fn is_single_empty_field(&self) -> bool {
        matches!(self.cells.as_slice(), [(_, Some(v))] if v.is_empty())
    }

    /// Return a copy of the row with surrounding whitespace removed from every value.
    pub fn trimmed(self) -> Self {
        self.cells
            .into_iter()
            .map(|(h, v)| (h, v.map(|s| s.trim().to_owned())))
            .collect()
    }
}

impl FromIterator<(String, Option<String>)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, Option<String>);
    type IntoIter = std::vec::IntoIter<(String, Option<String>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (heading, value) in &self.cells {
            map.serialize_entry(heading, value)?;
        }
        map.end()
    }
}

/// A bounded run of consecutive rows produced by [`crate::batch::BatchReader`].
pub type Batch = Vec<Row>;

/// What an adapter produced for one raw read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRecord {
    /// A row mapped onto the current headings.
    Row(Row),
    /// Nothing usable at this position (null record, blank line). Skipped by the engine.
    Blank,
    /// The underlying source is exhausted.
    End,
}
