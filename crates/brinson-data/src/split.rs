//! Multi-industry splitting.
//!
//! Instruments active in several sectors are replaced by one synthetic
//! position per (instrument, sector) pair. The synthetic identifier is
//! `"<instrument> - <sector>"` so downstream grouping keeps them apart.

use crate::columns;
use crate::error::{DataError, Result};
use crate::table::WideTable;
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};

const SPLIT_INSTRUMENT: &str = "split_instrument";
const SPLIT_IDENTIFIER: &str = "split_identifier";
const SPLIT_SECTOR: &str = "split_sector";
const SPLIT_FRACTION: &str = "split_fraction";
const IS_SPLIT: &str = "is_split";

/// Tolerance when checking that an instrument's fractions sum to one.
const FRACTION_TOLERANCE: f64 = 1e-9;

/// One non-zero cell of the split matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitEntry {
    /// Original instrument identifier.
    pub instrument: String,
    /// Target sector.
    pub sector: String,
    /// Fraction of the instrument's weight assigned to the sector.
    pub fraction: f64,
}

impl SplitEntry {
    /// Identifier of the synthetic position.
    pub fn identifier(&self) -> String {
        composite_identifier(&self.instrument, &self.sector)
    }
}

/// Build the identifier of a split position.
pub fn composite_identifier(instrument: &str, sector: &str) -> String {
    format!("{instrument} - {sector}")
}

/// Instrument-by-sector weight split matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitMatrix {
    entries: Vec<SplitEntry>,
}

impl SplitMatrix {
    /// Build a matrix from entries, rejecting repeated (instrument, sector) pairs.
    pub fn new(entries: Vec<SplitEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert((entry.instrument.as_str(), entry.sector.as_str())) {
                return Err(DataError::InvalidSplit(format!(
                    "instrument '{}' lists sector '{}' twice",
                    entry.instrument, entry.sector
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Read a wide split table: first column instrument, one column per sector.
    ///
    /// Empty and zero cells produce no entry. Rows labelled `total_label` are
    /// ignored.
    pub fn from_table(table: &WideTable, total_label: &str) -> Result<Self> {
        let table = table.without_label(0, total_label);
        if table.headers().len() < 2 {
            return Err(DataError::InvalidSplit(format!(
                "table '{}' has no sector columns",
                table.name()
            )));
        }
        if let Some(blank) = table.headers()[1..].iter().position(|h| h.trim().is_empty()) {
            return Err(DataError::InvalidSplit(format!(
                "table '{}' has an unnamed sector column at position {}",
                table.name(),
                blank + 1
            )));
        }

        let mut instruments = HashSet::new();
        let mut entries = Vec::new();
        for (i, row) in table.rows().iter().enumerate() {
            let instrument = row[0].trim();
            if !instruments.insert(instrument.to_string()) {
                return Err(DataError::InvalidSplit(format!(
                    "instrument '{instrument}' appears more than once"
                )));
            }

            for (j, cell) in row.iter().enumerate().skip(1) {
                let raw = cell.trim();
                if raw.is_empty() {
                    continue;
                }
                let fraction: f64 = raw.parse().map_err(|_| DataError::InvalidCell {
                    table: table.name().to_string(),
                    row: i,
                    column: table.headers()[j].clone(),
                    value: raw.to_string(),
                })?;
                if fraction == 0.0 {
                    continue;
                }
                entries.push(SplitEntry {
                    instrument: instrument.to_string(),
                    sector: table.headers()[j].trim().to_string(),
                    fraction,
                });
            }
        }

        Self::new(entries)
    }

    /// All entries in table order.
    pub fn entries(&self) -> &[SplitEntry] {
        &self.entries
    }

    /// Whether the matrix has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct instruments with at least one entry, sorted.
    pub fn instruments(&self) -> Vec<&str> {
        self.fraction_totals().into_keys().collect()
    }

    /// Sum of fractions per instrument.
    pub fn fraction_totals(&self) -> BTreeMap<&str, f64> {
        let mut totals = BTreeMap::new();
        for entry in &self.entries {
            *totals.entry(entry.instrument.as_str()).or_insert(0.0) += entry.fraction;
        }
        totals
    }

    /// Matrix as a long frame keyed by the original instrument.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let instruments: Vec<&str> = self.entries.iter().map(|e| e.instrument.as_str()).collect();
        let identifiers: Vec<String> = self.entries.iter().map(SplitEntry::identifier).collect();
        let sectors: Vec<&str> = self.entries.iter().map(|e| e.sector.as_str()).collect();
        let fractions: Vec<f64> = self.entries.iter().map(|e| e.fraction).collect();

        Ok(DataFrame::new(vec![
            Column::new(SPLIT_INSTRUMENT.into(), instruments),
            Column::new(SPLIT_IDENTIFIER.into(), identifiers),
            Column::new(SPLIT_SECTOR.into(), sectors),
            Column::new(SPLIT_FRACTION.into(), fractions),
        ])?)
    }

    fn warn_on_partial_splits(&self) {
        for (instrument, total) in self.fraction_totals() {
            if (total - 1.0).abs() > FRACTION_TOLERANCE {
                tracing::warn!(instrument, total, "Split fractions do not sum to one");
            }
        }
    }
}

/// Replace split instruments in a weight frame by their scaled sector rows.
///
/// `frame` has the portfolio long layout with the value in `weight_column`.
/// Each synthetic row carries `weight x fraction`, so the weights of an
/// instrument summed over its sectors equal its original weight whenever its
/// fractions sum to one.
pub fn split_weights(frame: &DataFrame, matrix: &SplitMatrix, weight_column: &str) -> Result<DataFrame> {
    matrix.warn_on_partial_splits();
    split_frame(
        frame,
        matrix,
        weight_column,
        col(weight_column) * col(SPLIT_FRACTION),
    )
}

/// Replace split instruments in a return frame by one row per sector.
///
/// Returns are not scaled: each synthetic position earns the instrument's
/// return.
pub fn split_returns(frame: &DataFrame, matrix: &SplitMatrix, return_column: &str) -> Result<DataFrame> {
    split_frame(frame, matrix, return_column, col(return_column))
}

fn split_frame(
    frame: &DataFrame,
    matrix: &SplitMatrix,
    value_column: &str,
    value: Expr,
) -> Result<DataFrame> {
    if matrix.is_empty() {
        return Ok(frame.clone());
    }

    let split_frame = matrix.to_frame()?;
    let markers = DataFrame::new(vec![Column::new(
        columns::INSTRUMENT.into(),
        matrix.instruments(),
    )])?
    .lazy()
    .with_column(lit(true).alias(IS_SPLIT));

    let unsplit = frame
        .clone()
        .lazy()
        .join(
            markers,
            [col(columns::INSTRUMENT)],
            [col(columns::INSTRUMENT)],
            JoinArgs::new(JoinType::Left),
        )
        .filter(col(IS_SPLIT).is_null())
        .select([
            col(columns::INSTRUMENT),
            col(columns::INSTRUMENT_TYPE),
            col(columns::SECTOR),
            col(columns::CURRENCY),
            col(columns::DATE),
            col(value_column),
        ]);

    let split = frame
        .clone()
        .lazy()
        .join(
            split_frame.lazy(),
            [col(columns::INSTRUMENT)],
            [col(SPLIT_INSTRUMENT)],
            JoinArgs::new(JoinType::Inner),
        )
        .select([
            col(SPLIT_IDENTIFIER).alias(columns::INSTRUMENT),
            col(columns::INSTRUMENT_TYPE),
            col(SPLIT_SECTOR).alias(columns::SECTOR),
            col(columns::CURRENCY),
            col(columns::DATE),
            value.alias(value_column),
        ]);

    let result = concat([unsplit, split], UnionArgs::default())?
        .sort(
            [columns::INSTRUMENT, columns::DATE],
            SortMultipleOptions::default(),
        )
        .collect()?;

    tracing::debug!(
        rows_before = frame.height(),
        rows_after = result.height(),
        instruments = matrix.instruments().len(),
        "Applied multi-industry split"
    );

    Ok(result)
}
