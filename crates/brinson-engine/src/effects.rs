//! Brinson effects per sector-day and per date.

use crate::config::EffectModel;
use crate::records::{DailyAttribution, EffectTriple, SectorAttribution, SectorDay};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Effects of one sector-day given the benchmark total return of its date.
///
/// - allocation = (wp - wb) x (rb - Rb)
/// - selection = wb x (rp - rb), or wp x (rp - rb) under the folded model
/// - interaction = (wp - wb) x (rp - rb), or 0 under the folded model
pub fn compute_effects(row: &SectorDay, benchmark_total: f64, model: EffectModel) -> EffectTriple {
    let allocation = row.active_weight() * (row.benchmark_return - benchmark_total);
    match model {
        EffectModel::BrinsonFachler => EffectTriple {
            allocation,
            selection: row.benchmark_weight * row.active_return(),
            interaction: row.active_weight() * row.active_return(),
        },
        EffectModel::FoldedInteraction => EffectTriple {
            allocation,
            selection: row.portfolio_weight * row.active_return(),
            interaction: 0.0,
        },
    }
}

/// Portfolio and benchmark total return per date (sum of weighted returns).
pub fn daily_totals(rows: &[SectorDay]) -> BTreeMap<NaiveDate, (f64, f64)> {
    let mut totals: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for row in rows {
        let entry = totals.entry(row.date).or_insert((0.0, 0.0));
        entry.0 += row.portfolio_weighted_return;
        entry.1 += row.benchmark_weighted_return;
    }
    totals
}

/// Attach date totals and effects to every sector-day.
pub fn attribute_sectors(rows: &[SectorDay], model: EffectModel) -> Vec<SectorAttribution> {
    let totals = daily_totals(rows);

    rows.iter()
        .map(|row| {
            let (portfolio_total, benchmark_total) =
                totals.get(&row.date).copied().unwrap_or_default();
            let effects = compute_effects(row, benchmark_total, model);
            SectorAttribution {
                date: row.date,
                sector: row.sector.clone(),
                portfolio_weight: row.portfolio_weight,
                benchmark_weight: row.benchmark_weight,
                portfolio_return: row.portfolio_return,
                benchmark_return: row.benchmark_return,
                portfolio_weighted_return: row.portfolio_weighted_return,
                benchmark_weighted_return: row.benchmark_weighted_return,
                portfolio_total_return: portfolio_total,
                benchmark_total_return: benchmark_total,
                allocation: effects.allocation,
                selection: effects.selection,
                interaction: effects.interaction,
                total_effect: effects.total(),
            }
        })
        .collect()
}

/// Sum sector rows per date.
pub fn aggregate_daily(sectors: &[SectorAttribution]) -> Vec<DailyAttribution> {
    let mut by_date: BTreeMap<NaiveDate, DailyAttribution> = BTreeMap::new();

    for s in sectors {
        let day = by_date.entry(s.date).or_insert_with(|| DailyAttribution {
            date: s.date,
            portfolio_weight: 0.0,
            benchmark_weight: 0.0,
            portfolio_weighted_return: 0.0,
            benchmark_weighted_return: 0.0,
            allocation: 0.0,
            selection: 0.0,
            interaction: 0.0,
            total_effect: 0.0,
            excess_return: 0.0,
        });
        day.portfolio_weight += s.portfolio_weight;
        day.benchmark_weight += s.benchmark_weight;
        day.portfolio_weighted_return += s.portfolio_weighted_return;
        day.benchmark_weighted_return += s.benchmark_weighted_return;
        day.allocation += s.allocation;
        day.selection += s.selection;
        day.interaction += s.interaction;
    }

    by_date
        .into_values()
        .map(|mut day| {
            day.total_effect = day.allocation + day.selection + day.interaction;
            day.excess_return = day.portfolio_weighted_return - day.benchmark_weighted_return;
            day
        })
        .collect()
}

/// Log every date whose effects miss the excess return by more than `tolerance`.
///
/// Returns the number of such dates. A residual means portfolio and benchmark
/// weights sum to different totals on that date.
pub fn check_identity(daily: &[DailyAttribution], tolerance: f64) -> usize {
    let mut violations = 0;
    for day in daily {
        let residual = day.identity_residual();
        if residual.abs() > tolerance {
            violations += 1;
            tracing::warn!(
                date = %day.date,
                residual,
                portfolio_weight = day.portfolio_weight,
                benchmark_weight = day.benchmark_weight,
                "Attribution effects do not sum to the excess return"
            );
        }
    }
    violations
}
