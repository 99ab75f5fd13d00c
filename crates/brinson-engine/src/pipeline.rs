//! The attribution entry point.

use crate::aggregate::{
    aggregate_portfolio_sectors, combine_benchmark, combine_positions, lag_weights,
};
use crate::combine::{combine_sector_days, sector_days_from_frame};
use crate::compounding::{
    LinkedAttribution, SectorLinkedEffects, SectorWeightAverage, average_sector_weights,
    link_effects, link_sector_effects,
};
use crate::config::{AttributionConfig, EffectModel};
use crate::effects::{aggregate_daily, attribute_sectors, check_identity};
use crate::error::{EngineError, Result};
use crate::inputs::{AttributionInputs, CompleteInputs};
use crate::records::{DailyAttribution, JoinReport, SectorAttribution, SectorDay};
use crate::redistribute::{CarriedReturn, DiscardedReturn, redistribute_portfolio_returns};
use brinson_data::{
    SplitMatrix, columns, normalize_benchmark_table, normalize_portfolio_table, split_returns,
    split_weights,
};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Ledger of the zero-date redistribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedistributionLedger {
    /// Dates removed because the benchmark return summed to zero.
    pub zero_dates: Vec<NaiveDate>,
    /// Returns moved forward to the next active date.
    pub carried: Vec<CarriedReturn>,
    /// Returns dropped on trailing zero dates.
    pub discarded: Vec<DiscardedReturn>,
}

/// Join-gap counts of the two weight/return joins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReports {
    /// Portfolio positions joined with instrument returns.
    pub portfolio: JoinReport,
    /// Benchmark sector weights joined with sector returns.
    pub benchmark: JoinReport,
}

/// Long-format frames after ingestion and splitting.
#[derive(Debug, Clone)]
pub struct NormalizedInputs {
    /// `[instrument, instrument_type, sector, currency, date, weight]`
    pub portfolio_weights: DataFrame,
    /// `[instrument, instrument_type, sector, currency, date, return]`
    pub portfolio_returns: DataFrame,
    /// `[sector, date, weight]`
    pub benchmark_weights: DataFrame,
    /// `[sector, date, return]`
    pub benchmark_returns: DataFrame,
}

/// Everything an attribution run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    /// Effect decomposition used.
    pub effect_model: EffectModel,
    /// One row per (date, sector) with effects.
    pub sectors: Vec<SectorAttribution>,
    /// One row per date with effects and excess return.
    pub daily: Vec<DailyAttribution>,
    /// Carino-linked effects and compounded returns.
    pub linked: LinkedAttribution,
    /// Linked effects per sector.
    pub sector_effects: Vec<SectorLinkedEffects>,
    /// Mean sector weights.
    pub average_weights: Vec<SectorWeightAverage>,
    /// What the zero-date redistribution moved or dropped.
    pub redistribution: RedistributionLedger,
    /// Join-gap counts (zero when the run started from sector-days).
    pub joins: JoinReports,
    /// Dates whose effects miss the excess return by more than the tolerance.
    pub identity_violations: usize,
}

impl AttributionResult {
    /// First attributed date.
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.daily.first().map(|d| d.date)
    }

    /// Last attributed date.
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.daily.last().map(|d| d.date)
    }
}

/// Runs Brinson attribution under one configuration.
///
/// # Examples
///
/// ```
/// use brinson_data::WideTable;
/// use brinson_engine::{AttributionConfig, AttributionEngine, AttributionInputs};
///
/// let table = |name: &str, csv: &str| WideTable::from_csv_reader(name, csv.as_bytes()).unwrap();
///
/// let inputs = AttributionInputs::new()
///     .with_portfolio_weights(table(
///         "pw",
///         "Instrument,Instr. Type,Sector 1,Ccy,02.01.2024\nAAA,Equity,Energy,EUR,1.0\nTotal,,,,1.0\n",
///     ))
///     .with_portfolio_returns(table(
///         "pr",
///         "Instrument,Instr. Type,Sector 1,Ccy,02.01.2024\nAAA,Equity,Energy,EUR,0.02\n",
///     ))
///     .with_benchmark_weights(table("bw", "Sector,02.01.2024\nEnergy,1.0\n"))
///     .with_benchmark_returns(table("br", "Sector,02.01.2024\nEnergy,0.01\nTotal,0.01\n"));
///
/// let engine = AttributionEngine::new(AttributionConfig::default())?;
/// let result = engine.run(&inputs)?;
///
/// assert_eq!(result.daily.len(), 1);
/// assert!((result.daily[0].selection - 0.01).abs() < 1e-12);
/// # Ok::<(), brinson_engine::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AttributionEngine {
    config: AttributionConfig,
}

impl AttributionEngine {
    /// Create an engine after validating the configuration.
    pub fn new(config: AttributionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub const fn config(&self) -> &AttributionConfig {
        &self.config
    }

    /// Normalize the raw tables and apply the optional multi-industry split.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingInputs`] before reading anything if a
    /// required table is absent, or the first ingestion error.
    pub fn normalize(&self, inputs: &AttributionInputs) -> Result<NormalizedInputs> {
        let CompleteInputs {
            portfolio_weights,
            portfolio_returns,
            benchmark_weights,
            benchmark_returns,
            multi_industry,
        } = inputs.complete()?;
        let options = &self.config.ingest;

        let mut pw = normalize_portfolio_table(portfolio_weights, columns::WEIGHT, options)?;
        let mut pr = normalize_portfolio_table(portfolio_returns, columns::RETURN, options)?;
        let bw = normalize_benchmark_table(benchmark_weights, columns::WEIGHT, options)?;
        let br = normalize_benchmark_table(benchmark_returns, columns::RETURN, options)?;

        if let Some(table) = multi_industry {
            let matrix = SplitMatrix::from_table(table, &options.total_label)?;
            pw = split_weights(&pw, &matrix, columns::WEIGHT)?;
            pr = split_returns(&pr, &matrix, columns::RETURN)?;
        }

        tracing::info!(
            portfolio_weights = pw.height(),
            portfolio_returns = pr.height(),
            benchmark_weights = bw.height(),
            benchmark_returns = br.height(),
            "Normalized input tables"
        );

        Ok(NormalizedInputs {
            portfolio_weights: pw,
            portfolio_returns: pr,
            benchmark_weights: bw,
            benchmark_returns: br,
        })
    }

    /// Build the combined sector-day rows from normalized frames.
    pub fn sector_days(&self, frames: &NormalizedInputs) -> Result<(Vec<SectorDay>, JoinReports)> {
        let pw = lag_weights(
            &frames.portfolio_weights,
            columns::INSTRUMENT,
            self.config.portfolio_weight_lag,
        )?;
        let bw = lag_weights(
            &frames.benchmark_weights,
            columns::SECTOR,
            self.config.benchmark_weight_lag,
        )?;

        let (positions, portfolio_join) = combine_positions(&pw, &frames.portfolio_returns)?;
        let portfolio = aggregate_portfolio_sectors(&positions)?;
        let (benchmark, benchmark_join) = combine_benchmark(&bw, &frames.benchmark_returns)?;

        let combined = combine_sector_days(&portfolio, &benchmark)?;
        let rows = sector_days_from_frame(&combined)?;

        Ok((
            rows,
            JoinReports {
                portfolio: portfolio_join,
                benchmark: benchmark_join,
            },
        ))
    }

    /// Run the whole pipeline from raw tables.
    pub fn run(&self, inputs: &AttributionInputs) -> Result<AttributionResult> {
        let frames = self.normalize(inputs)?;
        let (rows, joins) = self.sector_days(&frames)?;
        let mut result = self.attribute(&rows)?;
        result.joins = joins;
        Ok(result)
    }

    /// Attribute already-combined sector-days.
    ///
    /// Zero dates are redistributed and removed, effects are computed per
    /// sector-day and per date, and the daily effects are linked.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyResult`] when no active date remains and
    /// [`EngineError::ReturnBelowTotalLoss`] when a daily total cannot be
    /// compounded.
    pub fn attribute(&self, rows: &[SectorDay]) -> Result<AttributionResult> {
        let redistribution = redistribute_portfolio_returns(rows);
        if redistribution.rows.is_empty() {
            return Err(EngineError::EmptyResult);
        }

        let sectors = attribute_sectors(&redistribution.rows, self.config.effect_model);
        let daily = aggregate_daily(&sectors);
        let identity_violations = check_identity(&daily, self.config.identity_tolerance);

        let linked = link_effects(&daily)?;
        let sector_effects = link_sector_effects(&sectors, &linked);
        let average_weights = average_sector_weights(&sectors);

        tracing::info!(
            dates = daily.len(),
            sectors = sector_effects.len(),
            model = %self.config.effect_model,
            portfolio_return = linked.totals.portfolio_return,
            benchmark_return = linked.totals.benchmark_return,
            excess_return = linked.totals.excess_return,
            "Attribution complete"
        );

        Ok(AttributionResult {
            effect_model: self.config.effect_model,
            sectors,
            daily,
            linked,
            sector_effects,
            average_weights,
            redistribution: RedistributionLedger {
                zero_dates: redistribution.zero_dates,
                carried: redistribution.carried,
                discarded: redistribution.discarded,
            },
            joins: JoinReports::default(),
            identity_violations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::InputTable;

    #[test]
    fn test_run_reports_missing_inputs_before_reading() {
        let engine = AttributionEngine::new(AttributionConfig::default()).unwrap();
        let err = engine.run(&AttributionInputs::new()).unwrap_err();

        match err {
            EngineError::MissingInputs(missing) => assert_eq!(missing, InputTable::ALL.to_vec()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AttributionConfig::default();
        config.ingest.total_label = String::new();
        assert!(matches!(
            AttributionEngine::new(config),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_attribute_only_zero_dates_is_empty() {
        let engine = AttributionEngine::new(AttributionConfig::default()).unwrap();
        let mut row = SectorDay::empty(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), "Energy");
        row.portfolio_return = 0.01;

        assert!(matches!(engine.attribute(&[row]), Err(EngineError::EmptyResult)));
    }
}
