//! Compounding of returns and Carino linking of effects.
//!
//! Returns compound geometrically: `C_t = exp(sum ln(1 + r_i)) - 1`. Daily
//! effects are additive within a date but not across dates; Carino linking
//! rescales each date's effects by
//!
//! ```text
//! c_t = k_t / K
//! k_t = (ln(1 + Rp_t) - ln(1 + Rb_t)) / (Rp_t - Rb_t)
//! K   = (ln(1 + Rp_T) - ln(1 + Rb_T)) / (Rp_T - Rb_T)
//! ```
//!
//! where `Rp_T`, `Rb_T` are the compounded period returns. The scaled effects
//! then sum to `Rp_T - Rb_T`.

use crate::error::{EngineError, Result};
use crate::records::{DailyAttribution, EffectTriple, SectorAttribution};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running compounded return over a return sequence.
///
/// Created by [`calculate_compounded_change`]. Each call to `next` yields the
/// compounded return up to and including the current element.
#[derive(Debug, Clone)]
pub struct CompoundedChange<I> {
    returns: I,
    log_sum: f64,
}

impl<I: Iterator<Item = f64>> Iterator for CompoundedChange<I> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let r = self.returns.next()?;
        self.log_sum += r.ln_1p();
        Some(self.log_sum.exp_m1())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.returns.size_hint()
    }
}

/// Lazily compound a return series from its start.
///
/// # Examples
///
/// ```
/// use brinson_engine::compounding::calculate_compounded_change;
///
/// let compounded: Vec<f64> = calculate_compounded_change([0.1, 0.1]).collect();
/// assert!((compounded[1] - 0.21).abs() < 1e-12);
/// ```
pub fn calculate_compounded_change<I>(returns: I) -> CompoundedChange<I::IntoIter>
where
    I: IntoIterator<Item = f64>,
{
    CompoundedChange {
        returns: returns.into_iter(),
        log_sum: 0.0,
    }
}

/// Compounded return of a whole series (0 for an empty series).
pub fn total_compounded_return<I: IntoIterator<Item = f64>>(returns: I) -> f64 {
    calculate_compounded_change(returns).last().unwrap_or(0.0)
}

/// Subtract the first value from every value.
pub fn normalize_to_first(series: &[f64]) -> Vec<f64> {
    let Some(&first) = series.first() else {
        return Vec::new();
    };
    series.iter().map(|v| v - first).collect()
}

/// Reject returns for which `ln(1 + r)` is undefined.
pub fn ensure_compoundable(date: NaiveDate, value: f64) -> Result<()> {
    if value <= -1.0 || !value.is_finite() {
        return Err(EngineError::ReturnBelowTotalLoss { date, value });
    }
    Ok(())
}

/// Logarithmic ratio `(ln(1 + rp) - ln(1 + rb)) / (rp - rb)`, or `None` when
/// `rp == rb`.
fn log_ratio(portfolio: f64, benchmark: f64) -> Option<f64> {
    let excess = portfolio - benchmark;
    if excess == 0.0 {
        return None;
    }
    Some((portfolio.ln_1p() - benchmark.ln_1p()) / excess)
}

/// Carino coefficient of each date.
///
/// `daily` holds (portfolio, benchmark) returns per date in date order. The
/// coefficient is 1 on dates with zero excess; the period ratio is taken as 1
/// when the compounded returns are equal.
pub fn carino_coefficients(daily: &[(f64, f64)]) -> Vec<f64> {
    let portfolio_total = total_compounded_return(daily.iter().map(|d| d.0));
    let benchmark_total = total_compounded_return(daily.iter().map(|d| d.1));
    let period = log_ratio(portfolio_total, benchmark_total).unwrap_or(1.0);

    daily
        .iter()
        .map(|&(rp, rb)| log_ratio(rp, rb).map_or(1.0, |k| k / period))
        .collect()
}

/// One date of the linked series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedPoint {
    /// Date.
    pub date: NaiveDate,
    /// Carino coefficient of the date.
    pub coefficient: f64,
    /// Compounded portfolio return up to the date.
    pub portfolio_compounded_return: f64,
    /// Compounded benchmark return up to the date.
    pub benchmark_compounded_return: f64,
    /// Compounded portfolio minus compounded benchmark return.
    pub excess_return: f64,
    /// Cumulative linked allocation effect.
    pub allocation: f64,
    /// Cumulative linked selection effect.
    pub selection: f64,
    /// Cumulative linked interaction effect.
    pub interaction: f64,
    /// Cumulative linked sum of effects.
    pub total_effect: f64,
}

/// Period totals of the linked attribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedTotals {
    /// Compounded portfolio return over the period.
    pub portfolio_return: f64,
    /// Compounded benchmark return over the period.
    pub benchmark_return: f64,
    /// Portfolio minus benchmark compounded return.
    pub excess_return: f64,
    /// Linked allocation effect.
    pub allocation: f64,
    /// Linked selection effect.
    pub selection: f64,
    /// Linked interaction effect.
    pub interaction: f64,
    /// Linked sum of effects.
    pub total_effect: f64,
}

impl LinkedTotals {
    /// Excess return not explained by the linked effects.
    pub fn residual(&self) -> f64 {
        self.excess_return - self.total_effect
    }
}

/// Linked effects and compounded returns over the period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedAttribution {
    /// Cumulative series, one point per date.
    pub series: Vec<LinkedPoint>,
    /// Period totals (last point of the cumulative series).
    pub totals: LinkedTotals,
}

impl LinkedAttribution {
    /// The series shifted so every column starts at exactly 0.
    ///
    /// Coefficients are left unchanged.
    pub fn normalized(&self) -> Vec<LinkedPoint> {
        let portfolio = normalized_column(&self.series, |p| p.portfolio_compounded_return);
        let benchmark = normalized_column(&self.series, |p| p.benchmark_compounded_return);
        let excess = normalized_column(&self.series, |p| p.excess_return);
        let allocation = normalized_column(&self.series, |p| p.allocation);
        let selection = normalized_column(&self.series, |p| p.selection);
        let interaction = normalized_column(&self.series, |p| p.interaction);
        let total = normalized_column(&self.series, |p| p.total_effect);

        self.series
            .iter()
            .enumerate()
            .map(|(i, p)| LinkedPoint {
                date: p.date,
                coefficient: p.coefficient,
                portfolio_compounded_return: portfolio[i],
                benchmark_compounded_return: benchmark[i],
                excess_return: excess[i],
                allocation: allocation[i],
                selection: selection[i],
                interaction: interaction[i],
                total_effect: total[i],
            })
            .collect()
    }
}

fn normalized_column<F: Fn(&LinkedPoint) -> f64>(series: &[LinkedPoint], f: F) -> Vec<f64> {
    normalize_to_first(&series.iter().map(f).collect::<Vec<_>>())
}

/// Link daily effects over the whole period.
///
/// `daily` must be in date order.
///
/// # Errors
///
/// Returns [`EngineError::ReturnBelowTotalLoss`] if any daily portfolio or
/// benchmark return is -100% or worse.
pub fn link_effects(daily: &[DailyAttribution]) -> Result<LinkedAttribution> {
    for day in daily {
        ensure_compoundable(day.date, day.portfolio_weighted_return)?;
        ensure_compoundable(day.date, day.benchmark_weighted_return)?;
    }

    let returns: Vec<(f64, f64)> = daily
        .iter()
        .map(|d| (d.portfolio_weighted_return, d.benchmark_weighted_return))
        .collect();
    let coefficients = carino_coefficients(&returns);

    let portfolio = calculate_compounded_change(returns.iter().map(|r| r.0));
    let benchmark = calculate_compounded_change(returns.iter().map(|r| r.1));

    let mut cumulative = EffectTriple::default();
    let series: Vec<LinkedPoint> = daily
        .iter()
        .zip(&coefficients)
        .zip(portfolio.zip(benchmark))
        .map(|((day, &coefficient), (rp, rb))| {
            cumulative += day.effects().scaled(coefficient);
            LinkedPoint {
                date: day.date,
                coefficient,
                portfolio_compounded_return: rp,
                benchmark_compounded_return: rb,
                excess_return: rp - rb,
                allocation: cumulative.allocation,
                selection: cumulative.selection,
                interaction: cumulative.interaction,
                total_effect: cumulative.total(),
            }
        })
        .collect();

    let totals = series
        .last()
        .map(|p| LinkedTotals {
            portfolio_return: p.portfolio_compounded_return,
            benchmark_return: p.benchmark_compounded_return,
            excess_return: p.excess_return,
            allocation: p.allocation,
            selection: p.selection,
            interaction: p.interaction,
            total_effect: p.total_effect,
        })
        .unwrap_or_default();

    tracing::debug!(
        dates = series.len(),
        excess = totals.excess_return,
        linked_effects = totals.total_effect,
        "Linked daily effects"
    );

    Ok(LinkedAttribution { series, totals })
}

/// Linked effects of one sector over the period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorLinkedEffects {
    /// Sector label.
    pub sector: String,
    /// Linked allocation effect.
    pub allocation: f64,
    /// Linked selection effect.
    pub selection: f64,
    /// Linked interaction effect.
    pub interaction: f64,
    /// Linked sum of effects.
    pub total_effect: f64,
}

/// Apply each date's coefficient to the sector effects of that date and sum per
/// sector. The result sums over sectors to the linked totals.
pub fn link_sector_effects(
    sectors: &[SectorAttribution],
    linked: &LinkedAttribution,
) -> Vec<SectorLinkedEffects> {
    let coefficients: BTreeMap<NaiveDate, f64> = linked
        .series
        .iter()
        .map(|p| (p.date, p.coefficient))
        .collect();

    let mut by_sector: BTreeMap<&str, EffectTriple> = BTreeMap::new();
    for s in sectors {
        let coefficient = coefficients.get(&s.date).copied().unwrap_or(1.0);
        *by_sector.entry(s.sector.as_str()).or_default() += s.effects().scaled(coefficient);
    }

    by_sector
        .into_iter()
        .map(|(sector, e)| SectorLinkedEffects {
            sector: sector.to_string(),
            allocation: e.allocation,
            selection: e.selection,
            interaction: e.interaction,
            total_effect: e.total(),
        })
        .collect()
}

/// Mean portfolio and benchmark weight of a sector over the period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorWeightAverage {
    /// Sector label.
    pub sector: String,
    /// Mean portfolio weight.
    pub portfolio_weight: f64,
    /// Mean benchmark weight.
    pub benchmark_weight: f64,
}

/// Average sector weights over every date in `sectors`.
///
/// A sector without a row on some date counts as weight 0 on that date.
pub fn average_sector_weights(sectors: &[SectorAttribution]) -> Vec<SectorWeightAverage> {
    let dates: std::collections::BTreeSet<NaiveDate> = sectors.iter().map(|s| s.date).collect();
    if dates.is_empty() {
        return Vec::new();
    }
    let n = dates.len() as f64;

    let mut sums: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for s in sectors {
        let entry = sums.entry(s.sector.as_str()).or_insert((0.0, 0.0));
        entry.0 += s.portfolio_weight;
        entry.1 += s.benchmark_weight;
    }

    sums.into_iter()
        .map(|(sector, (wp, wb))| SectorWeightAverage {
            sector: sector.to_string(),
            portfolio_weight: wp / n,
            benchmark_weight: wb / n,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rstest::rstest;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn daily(d: u32, rp: f64, rb: f64, effects: EffectTriple) -> DailyAttribution {
        DailyAttribution {
            date: day(d),
            portfolio_weight: 1.0,
            benchmark_weight: 1.0,
            portfolio_weighted_return: rp,
            benchmark_weighted_return: rb,
            allocation: effects.allocation,
            selection: effects.selection,
            interaction: effects.interaction,
            total_effect: effects.total(),
            excess_return: rp - rb,
        }
    }

    fn split(excess: f64) -> EffectTriple {
        EffectTriple {
            allocation: excess * 0.5,
            selection: excess * 0.3,
            interaction: excess * 0.2,
        }
    }

    #[rstest]
    #[case(0.01, 10)]
    #[case(-0.02, 5)]
    #[case(0.0, 3)]
    #[case(0.5, 1)]
    fn test_constant_return_compounds_geometrically(#[case] r: f64, #[case] n: i32) {
        let series: Vec<f64> = calculate_compounded_change(vec![r; n as usize]).collect();
        assert_eq!(series.len(), n as usize);
        assert_relative_eq!(series[n as usize - 1], (1.0 + r).powi(n) - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_compounded_change_is_restartable() {
        let returns = [0.01, -0.02, 0.03];
        let first: Vec<f64> = calculate_compounded_change(returns).collect();
        let second: Vec<f64> = calculate_compounded_change(returns).collect();
        assert_eq!(first, second);
        assert_eq!(total_compounded_return(Vec::<f64>::new()), 0.0);
    }

    #[test]
    fn test_normalize_to_first() {
        let normalized = normalize_to_first(&[0.01, 0.03, -0.02]);
        assert_eq!(normalized[0], 0.0);
        assert_relative_eq!(normalized[1], 0.02, epsilon = 1e-15);
        assert!(normalize_to_first(&[]).is_empty());
    }

    #[test]
    fn test_coefficient_is_one_on_zero_excess_day() {
        let coefficients = carino_coefficients(&[(0.01, 0.005), (0.02, 0.02), (-0.01, 0.0)]);
        assert_eq!(coefficients[1], 1.0);
        assert!(coefficients[0] != 1.0);
    }

    #[test]
    fn test_scaled_effect_equals_unscaled_on_zero_excess_day() {
        let effects = EffectTriple {
            allocation: 0.004,
            selection: -0.004,
            interaction: 0.0,
        };
        let days = vec![daily(2, 0.01, 0.01, effects)];
        let linked = link_effects(&days).unwrap();

        assert_eq!(linked.series[0].coefficient, 1.0);
        assert_eq!(linked.series[0].allocation, 0.004);
        assert_eq!(linked.series[0].selection, -0.004);
    }

    #[test]
    fn test_linked_effects_sum_to_compounded_excess() {
        let returns = [(0.01, 0.005), (-0.02, -0.01), (0.03, 0.02), (0.0, 0.004)];
        let days: Vec<_> = returns
            .iter()
            .enumerate()
            .map(|(i, &(rp, rb))| daily(i as u32 + 2, rp, rb, split(rp - rb)))
            .collect();

        let linked = link_effects(&days).unwrap();
        let rp_total = total_compounded_return(returns.iter().map(|r| r.0));
        let rb_total = total_compounded_return(returns.iter().map(|r| r.1));

        assert_abs_diff_eq!(linked.totals.excess_return, rp_total - rb_total, epsilon = 1e-15);
        assert_abs_diff_eq!(linked.totals.total_effect, linked.totals.excess_return, epsilon = 1e-12);
        assert_abs_diff_eq!(linked.totals.residual(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_equal_period_returns_use_unit_period_ratio() {
        // same two returns in opposite order compound to the same total
        let returns = [(0.01, 0.02), (0.02, 0.01)];
        let coefficients = carino_coefficients(&returns);

        let k0 = (0.01f64.ln_1p() - 0.02f64.ln_1p()) / (0.01 - 0.02);
        assert_eq!(coefficients[0], k0);
        assert!(coefficients.iter().all(|c| c.is_finite()));

        let days: Vec<_> = returns
            .iter()
            .enumerate()
            .map(|(i, &(rp, rb))| daily(i as u32 + 2, rp, rb, split(rp - rb)))
            .collect();
        let linked = link_effects(&days).unwrap();
        assert_abs_diff_eq!(linked.totals.excess_return, 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(linked.totals.total_effect, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalized_series_starts_at_zero() {
        let days = vec![
            daily(2, 0.01, 0.005, split(0.005)),
            daily(3, 0.02, 0.01, split(0.01)),
        ];
        let normalized = link_effects(&days).unwrap().normalized();

        let first = &normalized[0];
        assert_eq!(first.portfolio_compounded_return, 0.0);
        assert_eq!(first.benchmark_compounded_return, 0.0);
        assert_eq!(first.excess_return, 0.0);
        assert_eq!(first.allocation, 0.0);
        assert_eq!(first.selection, 0.0);
        assert_eq!(first.interaction, 0.0);
        assert_eq!(first.total_effect, 0.0);
    }

    #[test]
    fn test_total_loss_rejected() {
        let days = vec![daily(2, -1.0, 0.0, EffectTriple::default())];
        assert!(matches!(
            link_effects(&days),
            Err(EngineError::ReturnBelowTotalLoss { value, .. }) if value == -1.0
        ));
    }

    fn sector_row(d: u32, sector: &str, wp: f64, wb: f64, effects: EffectTriple) -> SectorAttribution {
        SectorAttribution {
            date: day(d),
            sector: sector.to_string(),
            portfolio_weight: wp,
            benchmark_weight: wb,
            portfolio_return: 0.0,
            benchmark_return: 0.0,
            portfolio_weighted_return: 0.0,
            benchmark_weighted_return: 0.0,
            portfolio_total_return: 0.0,
            benchmark_total_return: 0.0,
            allocation: effects.allocation,
            selection: effects.selection,
            interaction: effects.interaction,
            total_effect: effects.total(),
        }
    }

    #[test]
    fn test_sector_linked_effects_sum_to_totals() {
        let sectors = vec![
            sector_row(2, "A", 0.6, 0.5, split(0.003)),
            sector_row(2, "B", 0.4, 0.5, split(0.002)),
            sector_row(3, "A", 0.6, 0.5, split(-0.001)),
            sector_row(3, "B", 0.4, 0.5, split(0.011)),
        ];
        let days = vec![
            daily(2, 0.01, 0.005, split(0.005)),
            daily(3, 0.02, 0.01, split(0.01)),
        ];
        let linked = link_effects(&days).unwrap();
        let by_sector = link_sector_effects(&sectors, &linked);

        assert_eq!(by_sector.len(), 2);
        let total: f64 = by_sector.iter().map(|s| s.total_effect).sum();
        assert_abs_diff_eq!(total, linked.totals.total_effect, epsilon = 1e-12);
        let allocation: f64 = by_sector.iter().map(|s| s.allocation).sum();
        assert_abs_diff_eq!(allocation, linked.totals.allocation, epsilon = 1e-12);
    }

    #[test]
    fn test_average_sector_weights_count_missing_days_as_zero() {
        let sectors = vec![
            sector_row(2, "A", 0.6, 0.5, EffectTriple::default()),
            sector_row(2, "B", 0.4, 0.5, EffectTriple::default()),
            sector_row(3, "A", 1.0, 1.0, EffectTriple::default()),
        ];

        let averages = average_sector_weights(&sectors);
        assert_eq!(averages[0].sector, "A");
        assert_relative_eq!(averages[0].portfolio_weight, 0.8);
        assert_relative_eq!(averages[1].benchmark_weight, 0.25);
    }
}
