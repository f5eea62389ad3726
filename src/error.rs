use thiserror::Error;

/// Convenience result type for data file operations.
pub type DataFileResult<T> = Result<T, DataFileError>;

/// Error type returned by row sources, adapters, the batch reader and the field-text parser.
///
/// This is a single error enum shared by every file type (and the optional Excel adapter).
#[derive(Debug, Error)]
pub enum DataFileError {
    /// Two non-empty headings share the same text.
    #[error("column '{heading}' appears multiple times in file ({file})")]
    DuplicateHeading { heading: String, file: String },

    /// `open` found neither a header row nor preset headings.
    #[error("no header row was defined and no headings were preset ({file})")]
    HeadingsNotDefined { file: String },

    /// A row was requested before the source was opened.
    #[error("data file '{file}' has not been opened")]
    FileNotOpened { file: String },

    /// Batch size set to an unusable value.
    #[error("cannot set batch size to {size}")]
    InvalidBatchSize { size: usize },

    /// A declared or derived field identifier is longer than the allowed maximum.
    #[error("field '{field}' determined from field text '{line}' and title '{title}' is too long")]
    FieldTooLong {
        field: String,
        line: String,
        title: String,
    },

    /// The underlying raw source could not be found or opened.
    #[error("unable to open data file '{path}': {message}")]
    SourceNotFound { path: String, message: String },

    /// The file format could not be inferred, or is not enabled in this build.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// Underlying I/O error while reading an already opened source.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited text parsing error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "excel")]
    /// Spreadsheet error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),
}
