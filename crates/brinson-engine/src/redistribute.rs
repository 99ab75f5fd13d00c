//! Zero-return date handling.
//!
//! A zero date is a date whose benchmark sector returns sum to exactly 0.0
//! (holiday, stale prices). Portfolio sector performance recorded on a zero
//! date is carried into the same sector on the next date with a non-zero
//! benchmark return, then every zero date is removed. Returns on trailing zero
//! dates have nowhere to go and are discarded; they are itemised in the
//! [`Redistribution`] ledger.

use crate::records::SectorDay;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Portfolio return moved from a zero date to the next active date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarriedReturn {
    /// Zero date the return was recorded on.
    pub from: NaiveDate,
    /// Active date that received it.
    pub to: NaiveDate,
    /// Sector.
    pub sector: String,
    /// Portfolio sector performance carried.
    pub amount: f64,
}

/// Portfolio return on a trailing zero date, dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscardedReturn {
    /// Zero date the return was recorded on.
    pub date: NaiveDate,
    /// Sector.
    pub sector: String,
    /// Portfolio sector performance dropped.
    pub amount: f64,
}

/// Rows after redistribution, with the ledger of what moved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Redistribution {
    /// Sector-days of active dates, sorted by date then sector.
    pub rows: Vec<SectorDay>,
    /// Zero dates removed, ascending.
    pub zero_dates: Vec<NaiveDate>,
    /// Returns moved forward.
    pub carried: Vec<CarriedReturn>,
    /// Returns dropped because no later active date exists.
    pub discarded: Vec<DiscardedReturn>,
}

impl Redistribution {
    /// Sum of the discarded returns.
    pub fn discarded_total(&self) -> f64 {
        self.discarded.iter().map(|d| d.amount).sum()
    }
}

/// Dates whose benchmark sector returns sum to exactly zero, ascending.
///
/// A date present only on the portfolio side has a benchmark sum of zero and
/// is therefore a zero date.
pub fn zero_return_dates(rows: &[SectorDay]) -> Vec<NaiveDate> {
    let mut sums: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in rows {
        *sums.entry(row.date).or_insert(0.0) += row.benchmark_return;
    }
    sums.into_iter()
        .filter(|(_, sum)| *sum == 0.0)
        .map(|(date, _)| date)
        .collect()
}

/// Carry portfolio returns off zero dates and drop those dates.
///
/// Carried amounts accumulate when several zero dates map to the same active
/// date. A receiving row has its weighted return recomputed as
/// `weight x performance`; when the active date has no row for the sector a
/// zero-weight row is inserted to hold the carried return.
pub fn redistribute_portfolio_returns(rows: &[SectorDay]) -> Redistribution {
    let zero_dates = zero_return_dates(rows);
    if zero_dates.is_empty() {
        return Redistribution {
            rows: rows.to_vec(),
            ..Default::default()
        };
    }

    let zero_set: BTreeSet<NaiveDate> = zero_dates.iter().copied().collect();
    let active: BTreeSet<NaiveDate> = rows
        .iter()
        .map(|r| r.date)
        .filter(|d| !zero_set.contains(d))
        .collect();
    let next_active = |date: NaiveDate| active.range(date..).next().copied();

    let mut carried = Vec::new();
    let mut discarded = Vec::new();
    let mut incoming: BTreeMap<(NaiveDate, String), f64> = BTreeMap::new();

    for row in rows.iter().filter(|r| zero_set.contains(&r.date)) {
        if row.portfolio_return == 0.0 {
            continue;
        }
        match next_active(row.date) {
            Some(to) => {
                *incoming.entry((to, row.sector.clone())).or_insert(0.0) += row.portfolio_return;
                carried.push(CarriedReturn {
                    from: row.date,
                    to,
                    sector: row.sector.clone(),
                    amount: row.portfolio_return,
                });
            }
            None => {
                tracing::warn!(
                    date = %row.date,
                    sector = %row.sector,
                    amount = row.portfolio_return,
                    "Discarding portfolio return on trailing zero-return date"
                );
                discarded.push(DiscardedReturn {
                    date: row.date,
                    sector: row.sector.clone(),
                    amount: row.portfolio_return,
                });
            }
        }
    }

    let mut kept: Vec<SectorDay> = rows
        .iter()
        .filter(|r| !zero_set.contains(&r.date))
        .cloned()
        .map(|mut row| {
            if let Some(amount) = incoming.remove(&(row.date, row.sector.clone())) {
                row.portfolio_return += amount;
                row.portfolio_weighted_return = row.portfolio_weight * row.portfolio_return;
            }
            row
        })
        .collect();

    for ((date, sector), amount) in incoming {
        let mut row = SectorDay::empty(date, sector);
        row.portfolio_return = amount;
        kept.push(row);
    }
    kept.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.sector.cmp(&b.sector)));

    tracing::info!(
        zero_dates = zero_dates.len(),
        carried = carried.len(),
        discarded = discarded.len(),
        "Redistributed zero-date portfolio returns"
    );

    Redistribution {
        rows: kept,
        zero_dates,
        carried,
        discarded,
    }
}
