//! Fixed-size batching over a [`RowSource`].
//!
//! [`BatchReader`] pulls rows from an opened source and hands them out in batches of at most
//! `batch_size` rows. A batch shorter than the batch size is taken to be the last one; after it
//! (or after an empty read) every call returns `None` without touching the source until
//! [`BatchReader::reset`].

use log::debug;

use crate::error::{DataFileError, DataFileResult};
use crate::source::{RawRowSupplier, RowSource};
use crate::types::Batch;

/// Batch size used by [`BatchReader::new`].
pub const DEFAULT_BATCH_SIZE: usize = 5_000;

/// Groups the rows of one [`RowSource`] into bounded batches.
///
/// The reader holds the source exclusively for its lifetime. Opening and closing the source stay
/// with the caller.
///
/// # Examples
///
/// ```
/// use datafile::batch::BatchReader;
/// use datafile::source::RowSource;
/// use datafile::source::memory::MemorySupplier;
///
/// # fn main() -> Result<(), datafile::DataFileError> {
/// let records = (0..7).map(|i| Some(vec![i.to_string()]));
/// let mut source = RowSource::with_headings("numbers", MemorySupplier::new(records), ["n"])?;
/// source.open()?;
///
/// let mut reader = BatchReader::with_batch_size(&mut source, 3)?;
/// assert_eq!(reader.batch_count(), 3);
/// let sizes: Vec<usize> = reader.by_ref().map(|b| b.map(|b| b.len())).collect::<Result<_, _>>()?;
/// assert_eq!(sizes, [3, 3, 1]);
/// assert_eq!(reader.last_batch_number(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BatchReader<'a, S> {
    source: &'a mut RowSource<S>,
    batch_size: usize,
    last_batch_number: usize,
    final_batch: bool,
    batch_count: Option<usize>,
}

impl<'a, S: RawRowSupplier> BatchReader<'a, S> {
    /// Wrap `source` with the default batch size.
    pub fn new(source: &'a mut RowSource<S>) -> Self {
        Self {
            source,
            batch_size: DEFAULT_BATCH_SIZE,
            last_batch_number: 0,
            final_batch: false,
            batch_count: None,
        }
    }

    /// Wrap `source` with batches of `batch_size` rows.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::InvalidBatchSize`] if `batch_size` is zero.
    pub fn with_batch_size(source: &'a mut RowSource<S>, batch_size: usize) -> DataFileResult<Self> {
        let mut reader = Self::new(source);
        reader.set_batch_size(batch_size)?;
        Ok(reader)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Change the batch size. The cached batch count is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::InvalidBatchSize`] if `batch_size` is zero; the current size is
    /// kept.
    pub fn set_batch_size(&mut self, batch_size: usize) -> DataFileResult<()> {
        if batch_size == 0 {
            return Err(DataFileError::InvalidBatchSize { size: batch_size });
        }
        self.batch_size = batch_size;
        self.batch_count = None;
        Ok(())
    }

    /// Number of batches handed out so far.
    pub fn last_batch_number(&self) -> usize {
        self.last_batch_number
    }

    /// Returns `true` once the last batch has been produced.
    pub fn is_final_batch_reached(&self) -> bool {
        self.final_batch
    }

    /// Expected number of batches, from the source's total row count.
    ///
    /// Computed on first call and cached until [`reset`](Self::reset) or a batch size change.
    /// A source with fewer rows than the batch size counts as one batch.
    pub fn batch_count(&mut self) -> usize {
        *self.batch_count.get_or_insert_with(|| {
            let rows = self.source.row_count();
            if rows < self.batch_size {
                1
            } else {
                rows.div_ceil(self.batch_size)
            }
        })
    }

    /// Read the next batch, or `None` once the source is exhausted.
    ///
    /// Never returns an empty batch.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`RowSource::next_row`]; rows read before it are dropped.
    pub fn next_batch(&mut self) -> DataFileResult<Option<Batch>> {
        if self.final_batch {
            return Ok(None);
        }

        let mut batch = Batch::with_capacity(self.batch_size.min(DEFAULT_BATCH_SIZE));
        while batch.len() < self.batch_size {
            match self.source.next_row()? {
                Some(row) => batch.push(row),
                None => break,
            }
        }

        if batch.is_empty() {
            self.final_batch = true;
            return Ok(None);
        }
        if batch.len() < self.batch_size {
            self.final_batch = true;
        }
        self.last_batch_number += 1;
        debug!(
            "batch {} of '{}': {} rows",
            self.last_batch_number,
            self.source.file_name().display(),
            batch.len()
        );
        Ok(Some(batch))
    }

    /// Clear the batch accounting and reopen the source from the start.
    pub fn reset(&mut self) -> DataFileResult<()> {
        self.last_batch_number = 0;
        self.final_batch = false;
        self.batch_count = None;
        self.source.reset()
    }

    pub fn source(&self) -> &RowSource<S> {
        self.source
    }
}

impl<S: RawRowSupplier> Iterator for BatchReader<'_, S> {
    type Item = DataFileResult<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_batch() {
            Ok(batch) => batch.map(Ok),
            Err(e) => {
                self.final_batch = true;
                Some(Err(e))
            }
        }
    }
}
