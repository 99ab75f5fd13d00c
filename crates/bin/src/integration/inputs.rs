//! Loading input tables from CSV files.

use super::CliError;
use brinson_data::{WideTable, date_values};
use brinson_engine::{AttributionInputs, InputTable, NormalizedInputs};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// File stem a table is looked up under inside an input directory.
pub(crate) const fn table_stem(kind: InputTable) -> &'static str {
    match kind {
        InputTable::PortfolioWeights => "portfolio_weights",
        InputTable::PortfolioReturns => "portfolio_returns",
        InputTable::BenchmarkWeights => "benchmark_weights",
        InputTable::BenchmarkReturns => "benchmark_returns",
    }
}

/// Stem of the optional multi-industry split file.
pub(crate) const MULTI_INDUSTRY_STEM: &str = "multi_industry";

/// Where each input table comes from.
///
/// Explicit paths win. Tables without one are looked up as `<stem>.csv`
/// inside `input_dir`, if given. Tables found nowhere stay absent so the
/// engine can report all of them together.
#[derive(Debug, Clone, Default)]
pub(crate) struct InputPaths {
    pub(crate) input_dir: Option<PathBuf>,
    pub(crate) portfolio_weights: Option<PathBuf>,
    pub(crate) portfolio_returns: Option<PathBuf>,
    pub(crate) benchmark_weights: Option<PathBuf>,
    pub(crate) benchmark_returns: Option<PathBuf>,
    pub(crate) multi_industry: Option<PathBuf>,
}

impl InputPaths {
    const fn explicit(&self, kind: InputTable) -> Option<&PathBuf> {
        match kind {
            InputTable::PortfolioWeights => self.portfolio_weights.as_ref(),
            InputTable::PortfolioReturns => self.portfolio_returns.as_ref(),
            InputTable::BenchmarkWeights => self.benchmark_weights.as_ref(),
            InputTable::BenchmarkReturns => self.benchmark_returns.as_ref(),
        }
    }

    fn from_dir(&self, stem: &str) -> Option<PathBuf> {
        let path = self.input_dir.as_ref()?.join(format!("{stem}.csv"));
        path.is_file().then_some(path)
    }

    /// Resolved path of a required table.
    pub(crate) fn resolve(&self, kind: InputTable) -> Option<PathBuf> {
        self.explicit(kind)
            .cloned()
            .or_else(|| self.from_dir(table_stem(kind)))
    }

    /// Resolved path of the multi-industry split table.
    pub(crate) fn resolve_multi_industry(&self) -> Option<PathBuf> {
        self.multi_industry
            .clone()
            .or_else(|| self.from_dir(MULTI_INDUSTRY_STEM))
    }

    /// Read every table that resolves to a file.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InputNotFound`] for an explicit path that is not a
    /// file, or the CSV error of the first unreadable table.
    pub(crate) fn load(&self) -> Result<AttributionInputs, CliError> {
        let mut inputs = AttributionInputs::new();

        for kind in InputTable::ALL {
            if let Some(path) = self.resolve(kind) {
                let table = read_table(&kind.to_string(), &path)?;
                inputs = inputs.with_table(kind, table);
            }
        }

        if let Some(path) = self.resolve_multi_industry() {
            inputs = inputs.with_multi_industry(read_table("multi-industry split", &path)?);
        }

        Ok(inputs)
    }
}

fn read_table(label: &str, path: &Path) -> Result<WideTable, CliError> {
    if !path.is_file() {
        return Err(CliError::InputNotFound {
            table: label.to_string(),
            path: path.display().to_string(),
        });
    }

    let table = WideTable::from_csv_path(path)?;
    tracing::debug!(
        table = label,
        path = %path.display(),
        rows = table.height(),
        columns = table.headers().len(),
        "Loaded input table"
    );
    Ok(table)
}

/// Row and date coverage of one normalized table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableReport {
    pub(crate) table: InputTable,
    pub(crate) rows: usize,
    pub(crate) dates: usize,
    pub(crate) first_date: Option<NaiveDate>,
    pub(crate) last_date: Option<NaiveDate>,
}

impl TableReport {
    fn from_frame(table: InputTable, df: &DataFrame) -> Result<Self, CliError> {
        let dates: BTreeSet<NaiveDate> = date_values(df)?.into_iter().collect();
        Ok(Self {
            table,
            rows: df.height(),
            dates: dates.len(),
            first_date: dates.first().copied(),
            last_date: dates.last().copied(),
        })
    }
}

/// Coverage of every normalized table, in load order.
pub(crate) fn describe(frames: &NormalizedInputs) -> Result<Vec<TableReport>, CliError> {
    InputTable::ALL
        .into_iter()
        .map(|kind| {
            let df = match kind {
                InputTable::PortfolioWeights => &frames.portfolio_weights,
                InputTable::PortfolioReturns => &frames.portfolio_returns,
                InputTable::BenchmarkWeights => &frames.benchmark_weights,
                InputTable::BenchmarkReturns => &frames.benchmark_returns,
            };
            TableReport::from_frame(kind, df)
        })
        .collect()
}
