//! Error types for the attribution engine.

use crate::inputs::InputTable;
use brinson_data::DataError;
use chrono::NaiveDate;
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while running an attribution.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input table could not be read or normalized
    #[error("Input error: {0}")]
    Data(#[from] DataError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Configuration file could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more required input tables were not supplied
    #[error("Missing required input tables: {}", list_tables(.0))]
    MissingInputs(Vec<InputTable>),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A frame returned null where a value is required
    #[error("Missing value in column '{column}' at row {row}")]
    MissingValue {
        /// Column name
        column: String,
        /// Row index in the frame
        row: usize,
    },

    /// A daily return of -100% or worse cannot be compounded
    #[error("Return {value} on {date} is at or below -100%")]
    ReturnBelowTotalLoss {
        /// Date of the offending return
        date: NaiveDate,
        /// Offending return
        value: f64,
    },

    /// Nothing left to attribute after cleaning
    #[error("No attribution dates remain after removing zero-return benchmark dates")]
    EmptyResult,
}

fn list_tables(tables: &[InputTable]) -> String {
    tables
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
