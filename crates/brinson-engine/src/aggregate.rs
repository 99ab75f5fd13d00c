//! Position combination, weight lag and sector aggregation.
//!
//! All functions take and return long-format polars frames keyed by `date`.

use crate::config::WeightLag;
use crate::error::Result;
use crate::records::JoinReport;
use brinson_data::columns;
use polars::prelude::*;

const SECTOR_WEIGHT: &str = "sector_weight";
const CONTRIBUTION: &str = "contribution";
const WEIGHTED: &str = "weighted";

/// Shift weights one observation forward within each `group` when lagged.
///
/// The first observation of a group has no predecessor and gets weight 0.
pub fn lag_weights(weights: &DataFrame, group: &str, lag: WeightLag) -> Result<DataFrame> {
    match lag {
        WeightLag::SameDay => Ok(weights.clone()),
        WeightLag::PreviousPeriod => {
            let lagged = weights
                .clone()
                .lazy()
                .sort([group, columns::DATE], SortMultipleOptions::default())
                .with_column(
                    col(columns::WEIGHT)
                        .shift(lit(1))
                        .over([col(group)])
                        .fill_null(lit(0.0))
                        .alias(columns::WEIGHT),
                )
                .collect()?;

            tracing::debug!(group, rows = lagged.height(), "Lagged weights by one period");
            Ok(lagged)
        }
    }
}

/// Inner-join position weights with position returns on instrument and date.
///
/// Positions without a return (or returns without a weight) are dropped; the
/// counts are returned in the [`JoinReport`].
///
/// Output columns: `[instrument, instrument_type, sector, currency, date, weight, return]`.
pub fn combine_positions(weights: &DataFrame, returns: &DataFrame) -> Result<(DataFrame, JoinReport)> {
    let returns_only = returns
        .clone()
        .lazy()
        .select([col(columns::INSTRUMENT), col(columns::DATE), col(columns::RETURN)]);

    let combined = weights
        .clone()
        .lazy()
        .join(
            returns_only,
            [col(columns::INSTRUMENT), col(columns::DATE)],
            [col(columns::INSTRUMENT), col(columns::DATE)],
            JoinArgs::new(JoinType::Inner),
        )
        .select([
            col(columns::INSTRUMENT),
            col(columns::INSTRUMENT_TYPE),
            col(columns::SECTOR),
            col(columns::CURRENCY),
            col(columns::DATE),
            col(columns::WEIGHT),
            col(columns::RETURN),
        ])
        .collect()?;

    let report = JoinReport {
        left_rows: weights.height(),
        right_rows: returns.height(),
        matched_rows: combined.height(),
    };
    log_join("portfolio", &report);

    Ok((combined, report))
}

/// Roll positions up to sector level.
///
/// Sector weight is the sum of member weights. Sector performance is the sum of
/// member returns weighted by their share of the sector weight. Sector-days
/// whose weight is exactly zero are removed before the division.
///
/// Output columns: `[date, sector, portfolio_weight, portfolio_return,
/// portfolio_weighted_return]`, sorted by date then sector.
pub fn aggregate_portfolio_sectors(positions: &DataFrame) -> Result<DataFrame> {
    let sectors = positions
        .clone()
        .lazy()
        .with_column(
            col(columns::WEIGHT)
                .sum()
                .over([col(columns::DATE), col(columns::SECTOR)])
                .alias(SECTOR_WEIGHT),
        )
        .filter(col(SECTOR_WEIGHT).neq(lit(0.0)))
        .with_columns([
            (col(columns::WEIGHT) / col(SECTOR_WEIGHT) * col(columns::RETURN)).alias(CONTRIBUTION),
            (col(columns::WEIGHT) * col(columns::RETURN)).alias(WEIGHTED),
        ])
        .group_by([col(columns::DATE), col(columns::SECTOR)])
        .agg([
            col(columns::WEIGHT).sum().alias(columns::PORTFOLIO_WEIGHT),
            col(CONTRIBUTION).sum().alias(columns::PORTFOLIO_RETURN),
            col(WEIGHTED).sum().alias(columns::PORTFOLIO_WEIGHTED_RETURN),
        ])
        .sort(
            [columns::DATE, columns::SECTOR],
            SortMultipleOptions::default(),
        )
        .collect()?;

    tracing::debug!(
        positions = positions.height(),
        sector_days = sectors.height(),
        "Aggregated portfolio sectors"
    );

    Ok(sectors)
}

/// Inner-join benchmark sector weights with sector returns.
///
/// Output columns: `[date, sector, benchmark_weight, benchmark_return,
/// benchmark_weighted_return]`, sorted by date then sector.
pub fn combine_benchmark(weights: &DataFrame, returns: &DataFrame) -> Result<(DataFrame, JoinReport)> {
    let combined = weights
        .clone()
        .lazy()
        .join(
            returns.clone().lazy(),
            [col(columns::SECTOR), col(columns::DATE)],
            [col(columns::SECTOR), col(columns::DATE)],
            JoinArgs::new(JoinType::Inner),
        )
        .select([
            col(columns::DATE),
            col(columns::SECTOR),
            col(columns::WEIGHT).alias(columns::BENCHMARK_WEIGHT),
            col(columns::RETURN).alias(columns::BENCHMARK_RETURN),
            (col(columns::WEIGHT) * col(columns::RETURN)).alias(columns::BENCHMARK_WEIGHTED_RETURN),
        ])
        .sort(
            [columns::DATE, columns::SECTOR],
            SortMultipleOptions::default(),
        )
        .collect()?;

    let report = JoinReport {
        left_rows: weights.height(),
        right_rows: returns.height(),
        matched_rows: combined.height(),
    };
    log_join("benchmark", &report);

    Ok((combined, report))
}

fn log_join(side: &str, report: &JoinReport) {
    tracing::debug!(
        side,
        weight_rows = report.left_rows,
        return_rows = report.right_rows,
        matched = report.matched_rows,
        unmatched_weights = report.unmatched_left(),
        unmatched_returns = report.unmatched_right(),
        "Joined weights with returns"
    );
}
