//! Glue between command-line arguments and the attribution crates.
//!
//! Loads the CSV input tables, resolves the run configuration from a JSON
//! file plus flag overrides, and reports what ingestion produced.

pub(crate) mod inputs;
pub(crate) mod settings;

use brinson_data::DataError;
use brinson_engine::EngineError;
use brinson_output::ExportError;
use thiserror::Error;

/// Errors surfaced by the command-line tool.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// Ingestion failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Attribution failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Writing results failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// An input path does not point at a readable file.
    #[error("Input file not found for {table}: {path}")]
    InputNotFound {
        /// Table the file was meant to provide.
        table: String,
        /// Path that was given.
        path: String,
    },
}
