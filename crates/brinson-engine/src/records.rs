//! Typed rows produced by the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sector-level weights and returns of one date, portfolio and benchmark side.
///
/// Fields absent on one side after the outer join are 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorDay {
    /// Observation date.
    pub date: NaiveDate,
    /// Sector label.
    pub sector: String,
    /// Portfolio sector weight.
    pub portfolio_weight: f64,
    /// Benchmark sector weight.
    pub benchmark_weight: f64,
    /// Portfolio sector performance.
    pub portfolio_return: f64,
    /// Benchmark sector performance.
    pub benchmark_return: f64,
    /// Portfolio contribution to the total portfolio return.
    pub portfolio_weighted_return: f64,
    /// Benchmark contribution to the total benchmark return.
    pub benchmark_weighted_return: f64,
}

impl SectorDay {
    /// A sector-day with every value zero.
    pub fn empty(date: NaiveDate, sector: impl Into<String>) -> Self {
        Self {
            date,
            sector: sector.into(),
            portfolio_weight: 0.0,
            benchmark_weight: 0.0,
            portfolio_return: 0.0,
            benchmark_return: 0.0,
            portfolio_weighted_return: 0.0,
            benchmark_weighted_return: 0.0,
        }
    }

    /// Portfolio minus benchmark weight.
    pub fn active_weight(&self) -> f64 {
        self.portfolio_weight - self.benchmark_weight
    }

    /// Portfolio minus benchmark sector performance.
    pub fn active_return(&self) -> f64 {
        self.portfolio_return - self.benchmark_return
    }
}

/// Allocation, selection and interaction of one sector-day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectTriple {
    /// Allocation effect.
    pub allocation: f64,
    /// Selection effect.
    pub selection: f64,
    /// Interaction effect (0 under the folded model).
    pub interaction: f64,
}

impl EffectTriple {
    /// Arithmetic sum of the three effects.
    pub fn total(&self) -> f64 {
        self.allocation + self.selection + self.interaction
    }

    /// Every effect multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            allocation: self.allocation * factor,
            selection: self.selection * factor,
            interaction: self.interaction * factor,
        }
    }
}

impl std::ops::Add for EffectTriple {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            allocation: self.allocation + rhs.allocation,
            selection: self.selection + rhs.selection,
            interaction: self.interaction + rhs.interaction,
        }
    }
}

impl std::ops::AddAssign for EffectTriple {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Sector-level output row: a sector-day, the date totals and its effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorAttribution {
    /// Observation date.
    pub date: NaiveDate,
    /// Sector label.
    pub sector: String,
    /// Portfolio sector weight.
    pub portfolio_weight: f64,
    /// Benchmark sector weight.
    pub benchmark_weight: f64,
    /// Portfolio sector performance.
    pub portfolio_return: f64,
    /// Benchmark sector performance.
    pub benchmark_return: f64,
    /// Portfolio contribution to the total portfolio return.
    pub portfolio_weighted_return: f64,
    /// Benchmark contribution to the total benchmark return.
    pub benchmark_weighted_return: f64,
    /// Total portfolio return of the date.
    pub portfolio_total_return: f64,
    /// Total benchmark return of the date.
    pub benchmark_total_return: f64,
    /// Allocation effect.
    pub allocation: f64,
    /// Selection effect.
    pub selection: f64,
    /// Interaction effect.
    pub interaction: f64,
    /// Sum of the effects.
    pub total_effect: f64,
}

impl SectorAttribution {
    /// The effects of this row.
    pub fn effects(&self) -> EffectTriple {
        EffectTriple {
            allocation: self.allocation,
            selection: self.selection,
            interaction: self.interaction,
        }
    }
}

/// Daily-aggregate output row: one date with the sector dimension summed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAttribution {
    /// Observation date.
    pub date: NaiveDate,
    /// Sum of portfolio sector weights.
    pub portfolio_weight: f64,
    /// Sum of benchmark sector weights.
    pub benchmark_weight: f64,
    /// Total portfolio return.
    pub portfolio_weighted_return: f64,
    /// Total benchmark return.
    pub benchmark_weighted_return: f64,
    /// Allocation effect.
    pub allocation: f64,
    /// Selection effect.
    pub selection: f64,
    /// Interaction effect.
    pub interaction: f64,
    /// Sum of the effects.
    pub total_effect: f64,
    /// Portfolio minus benchmark return.
    pub excess_return: f64,
}

impl DailyAttribution {
    /// The effects of this row.
    pub fn effects(&self) -> EffectTriple {
        EffectTriple {
            allocation: self.allocation,
            selection: self.selection,
            interaction: self.interaction,
        }
    }

    /// Difference between the excess return and the sum of effects.
    pub fn identity_residual(&self) -> f64 {
        self.excess_return - self.total_effect
    }
}

/// Row counts of an inner join between a weight and a return table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReport {
    /// Rows in the weight table.
    pub left_rows: usize,
    /// Rows in the return table.
    pub right_rows: usize,
    /// Rows present in both.
    pub matched_rows: usize,
}

impl JoinReport {
    /// Weight rows without a matching return.
    pub const fn unmatched_left(&self) -> usize {
        self.left_rows.saturating_sub(self.matched_rows)
    }

    /// Return rows without a matching weight.
    pub const fn unmatched_right(&self) -> usize {
        self.right_rows.saturating_sub(self.matched_rows)
    }
}
