//! `datafile` reads tabular and semi-structured files as a uniform stream of [`types::Row`]s:
//! heading → value maps in heading order.
//!
//! The row-iteration engine is [`source::RowSource`]. It owns the headings, the open/read/close
//! lifecycle, blank-row suppression, trimming and the row limit, and delegates the raw reading to
//! a pluggable adapter ([`source::RawRowSupplier`]). [`batch::BatchReader`] groups a source's
//! rows into bounded batches.
//!
//! ## What you can read
//!
//! **File formats (auto-detected by extension):**
//!
//! - **Delimited text**: `.csv`, `.tsv`, `.txt`
//! - **Spreadsheets** (requires the Cargo feature `excel`, on by default): `.xlsx`, `.xls`,
//!   `.xlsm`, `.xlsb`, `.ods`
//! - **Field text**: `.ftx`, a compact line-per-field markup parsed by [`field_text`]
//!
//! Rows the adapter reports as blank, rows made of a single empty field, and rows with at least
//! as many empty cells as there are non-empty headings are skipped.
//!
//! ## Quick examples
//!
//! ```no_run
//! use datafile::source::{load_from_path, OpenOptions};
//!
//! # fn main() -> Result<(), datafile::DataFileError> {
//! // Auto-detects by extension and reads the first line as headings.
//! let rows = load_from_path("grades.csv", &OpenOptions::default())?;
//! for row in &rows {
//!     println!("{:?} {:?}", row.get("name"), row.get("grade"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Reading in batches:
//!
//! ```no_run
//! use datafile::batch::BatchReader;
//! use datafile::source::delimited::{delimited_source, DelimitedOptions};
//!
//! # fn main() -> Result<(), datafile::DataFileError> {
//! let mut source = delimited_source("large.tsv", DelimitedOptions::tsv());
//! source.set_header_row(true);
//! source.open()?;
//!
//! let mut reader = BatchReader::with_batch_size(&mut source, 500)?;
//! println!("expecting {} batches", reader.batch_count());
//! while let Some(batch) = reader.next_batch()? {
//!     println!("batch {} has {} rows", reader.last_batch_number(), batch.len());
//! }
//! source.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! Parsing one field-text line:
//!
//! ```rust
//! use datafile::field_text::parse_field_line;
//!
//! # fn main() -> Result<(), datafile::DataFileError> {
//! let def = parse_field_line("Have you ever kept birds? $ever_kept_birds :yes_no *")?;
//! assert_eq!(def.field, "ever_kept_birds");
//! assert!(def.required);
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade; install any logger to see
//! them. Lifecycle events, failures and alerts can also be sent to a
//! [`source::RowSourceObserver`].

pub mod batch;
pub mod error;
pub mod field_text;
pub mod source;
pub mod types;

pub use error::{DataFileError, DataFileResult};
