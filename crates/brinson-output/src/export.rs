//! Sheet-per-table export of attribution results.
//!
//! Every result table is written as one sheet: a CSV or JSON document named
//! after the table. Dates are always an explicit `date` column.

use brinson_engine::AttributionResult;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The result has no attributed dates.
    #[error("Attribution result has no dates")]
    EmptyResult,
}

/// Export format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    #[default]
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" | "pretty" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Serialize rows as a CSV document with a header line.
pub(crate) fn rows_to_csv<T: Serialize>(rows: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in rows {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl<T: Serialize> Exporter for [T] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => rows_to_csv(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// The tables of an attribution result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sheet {
    /// One row per (date, sector) with effects.
    SectorAttribution,
    /// One row per date with effects and excess return.
    DailyAttribution,
    /// Linked effects and compounded returns, normalized to start at 0.
    LinkedEffects,
    /// Linked effects per sector over the period.
    SectorEffects,
    /// Mean sector weights over the period.
    AverageWeights,
    /// Returns carried off zero-return dates.
    CarriedReturns,
    /// Returns dropped on trailing zero-return dates.
    DiscardedReturns,
}

impl Sheet {
    /// Every sheet in workbook order.
    pub const ALL: [Self; 7] = [
        Self::SectorAttribution,
        Self::DailyAttribution,
        Self::LinkedEffects,
        Self::SectorEffects,
        Self::AverageWeights,
        Self::CarriedReturns,
        Self::DiscardedReturns,
    ];

    /// Sheet name, used as file stem.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SectorAttribution => "sector_attribution",
            Self::DailyAttribution => "daily_attribution",
            Self::LinkedEffects => "linked_effects",
            Self::SectorEffects => "sector_effects",
            Self::AverageWeights => "average_weights",
            Self::CarriedReturns => "carried_returns",
            Self::DiscardedReturns => "discarded_returns",
        }
    }
}

impl fmt::Display for Sheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An attribution result viewed as a set of sheets.
#[derive(Debug, Clone, Copy)]
pub struct AttributionWorkbook<'a> {
    result: &'a AttributionResult,
}

impl<'a> AttributionWorkbook<'a> {
    /// Wrap a result.
    pub const fn new(result: &'a AttributionResult) -> Self {
        Self { result }
    }

    /// Render one sheet.
    pub fn sheet(&self, sheet: Sheet, format: ExportFormat) -> Result<String, ExportError> {
        let r = self.result;
        match sheet {
            Sheet::SectorAttribution => r.sectors.export_to_string(format),
            Sheet::DailyAttribution => r.daily.export_to_string(format),
            Sheet::LinkedEffects => r.linked.normalized().export_to_string(format),
            Sheet::SectorEffects => r.sector_effects.export_to_string(format),
            Sheet::AverageWeights => r.average_weights.export_to_string(format),
            Sheet::CarriedReturns => r.redistribution.carried.export_to_string(format),
            Sheet::DiscardedReturns => r.redistribution.discarded.export_to_string(format),
        }
    }

    /// Write every sheet into `dir` as `<sheet>.<ext>`, creating the directory.
    ///
    /// Returns the written paths in workbook order.
    pub fn write_to_dir(&self, dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>, ExportError> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(Sheet::ALL.len());
        for sheet in Sheet::ALL {
            let path = dir.join(format!("{}.{}", sheet.name(), format.extension()));
            let content = self.sheet(sheet, format)?;
            let mut file = File::create(&path)?;
            file.write_all(content.as_bytes())?;
            tracing::debug!(sheet = %sheet, path = %path.display(), "Wrote sheet");
            written.push(path);
        }

        tracing::info!(dir = %dir.display(), sheets = written.len(), "Exported attribution workbook");
        Ok(written)
    }
}
