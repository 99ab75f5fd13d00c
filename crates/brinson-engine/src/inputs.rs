//! Input tables of an attribution run.

use crate::error::{EngineError, Result};
use brinson_data::WideTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The required input tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputTable {
    /// Instrument weights per date.
    PortfolioWeights,
    /// Instrument returns per date.
    PortfolioReturns,
    /// Benchmark sector weights per date.
    BenchmarkWeights,
    /// Benchmark sector returns per date.
    BenchmarkReturns,
}

impl InputTable {
    /// All required tables in load order.
    pub const ALL: [Self; 4] = [
        Self::PortfolioWeights,
        Self::PortfolioReturns,
        Self::BenchmarkWeights,
        Self::BenchmarkReturns,
    ];
}

impl fmt::Display for InputTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortfolioWeights => write!(f, "portfolio weights"),
            Self::PortfolioReturns => write!(f, "portfolio returns"),
            Self::BenchmarkWeights => write!(f, "benchmark weights"),
            Self::BenchmarkReturns => write!(f, "benchmark returns"),
        }
    }
}

/// Raw tables handed to [`AttributionEngine::run`](crate::AttributionEngine::run).
///
/// The four required tables are checked together so the caller learns every
/// missing one at once. The multi-industry split table is optional.
#[derive(Debug, Clone, Default)]
pub struct AttributionInputs {
    portfolio_weights: Option<WideTable>,
    portfolio_returns: Option<WideTable>,
    benchmark_weights: Option<WideTable>,
    benchmark_returns: Option<WideTable>,
    multi_industry: Option<WideTable>,
}

/// The four required tables plus the optional split table, all present.
#[derive(Debug, Clone, Copy)]
pub struct CompleteInputs<'a> {
    /// Instrument weights.
    pub portfolio_weights: &'a WideTable,
    /// Instrument returns.
    pub portfolio_returns: &'a WideTable,
    /// Benchmark sector weights.
    pub benchmark_weights: &'a WideTable,
    /// Benchmark sector returns.
    pub benchmark_returns: &'a WideTable,
    /// Multi-industry split matrix, when supplied.
    pub multi_industry: Option<&'a WideTable>,
}

impl AttributionInputs {
    /// Empty inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the portfolio weight table.
    pub fn with_portfolio_weights(mut self, table: WideTable) -> Self {
        self.portfolio_weights = Some(table);
        self
    }

    /// Set the portfolio return table.
    pub fn with_portfolio_returns(mut self, table: WideTable) -> Self {
        self.portfolio_returns = Some(table);
        self
    }

    /// Set the benchmark weight table.
    pub fn with_benchmark_weights(mut self, table: WideTable) -> Self {
        self.benchmark_weights = Some(table);
        self
    }

    /// Set the benchmark return table.
    pub fn with_benchmark_returns(mut self, table: WideTable) -> Self {
        self.benchmark_returns = Some(table);
        self
    }

    /// Set the multi-industry split table.
    pub fn with_multi_industry(mut self, table: WideTable) -> Self {
        self.multi_industry = Some(table);
        self
    }

    /// Set a required table by kind.
    pub fn with_table(self, kind: InputTable, table: WideTable) -> Self {
        match kind {
            InputTable::PortfolioWeights => self.with_portfolio_weights(table),
            InputTable::PortfolioReturns => self.with_portfolio_returns(table),
            InputTable::BenchmarkWeights => self.with_benchmark_weights(table),
            InputTable::BenchmarkReturns => self.with_benchmark_returns(table),
        }
    }

    /// Required tables that have not been supplied.
    pub fn missing(&self) -> Vec<InputTable> {
        InputTable::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }

    /// A required table, if supplied.
    pub const fn get(&self, kind: InputTable) -> Option<&WideTable> {
        match kind {
            InputTable::PortfolioWeights => self.portfolio_weights.as_ref(),
            InputTable::PortfolioReturns => self.portfolio_returns.as_ref(),
            InputTable::BenchmarkWeights => self.benchmark_weights.as_ref(),
            InputTable::BenchmarkReturns => self.benchmark_returns.as_ref(),
        }
    }

    /// The multi-industry split table, if supplied.
    pub const fn multi_industry(&self) -> Option<&WideTable> {
        self.multi_industry.as_ref()
    }

    /// Borrow every table, or report all missing required tables.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingInputs`] listing each absent table.
    pub fn complete(&self) -> Result<CompleteInputs<'_>> {
        match (
            &self.portfolio_weights,
            &self.portfolio_returns,
            &self.benchmark_weights,
            &self.benchmark_returns,
        ) {
            (Some(pw), Some(pr), Some(bw), Some(br)) => Ok(CompleteInputs {
                portfolio_weights: pw,
                portfolio_returns: pr,
                benchmark_weights: bw,
                benchmark_returns: br,
                multi_industry: self.multi_industry.as_ref(),
            }),
            _ => Err(EngineError::MissingInputs(self.missing())),
        }
    }
}
