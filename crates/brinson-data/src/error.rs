//! Error types for input tables and normalization.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading or normalizing input tables.
#[derive(Debug, Error)]
pub enum DataError {
    /// CSV reading error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// A required identifier column is absent
    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn {
        /// Table being normalized
        table: String,
        /// Name of the missing column
        column: String,
    },

    /// A date header does not match the configured format
    #[error("Table '{table}': date header '{header}' does not match format '{format}'")]
    InvalidDateHeader {
        /// Table being normalized
        table: String,
        /// Offending header
        header: String,
        /// Expected chrono format string
        format: String,
    },

    /// The table has identifier columns but no date columns
    #[error("Table '{0}' has no date columns")]
    NoDateColumns(String),

    /// The same date appears twice on the date axis
    #[error("Table '{table}': date {date} appears more than once")]
    DuplicateDate {
        /// Table being normalized
        table: String,
        /// Repeated date
        date: String,
    },

    /// A value cell could not be parsed as a number
    #[error("Table '{table}': cannot parse '{value}' in row {row}, column '{column}'")]
    InvalidCell {
        /// Table being normalized
        table: String,
        /// Zero-based data row index
        row: usize,
        /// Column header of the cell
        column: String,
        /// Raw cell contents
        value: String,
    },

    /// A row has a different number of cells than the header
    #[error("Row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based data row index
        row: usize,
        /// Number of header cells
        expected: usize,
        /// Number of cells in the row
        actual: usize,
    },

    /// The table has no header or no data
    #[error("Table '{0}' is empty")]
    EmptyTable(String),

    /// Multi-industry split matrix problem
    #[error("Invalid multi-industry split: {0}")]
    InvalidSplit(String),

    /// Polars returned a null where a value is required
    #[error("Missing value in column '{column}' at row {row}")]
    MissingValue {
        /// Column name
        column: String,
        /// Row index in the frame
        row: usize,
    },
}
