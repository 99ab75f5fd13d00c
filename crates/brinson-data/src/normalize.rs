//! Wide-to-long normalization.
//!
//! Turns a [`WideTable`] into a long-format polars frame with one row per
//! (identifier, date) cell. Date headers must all parse under one fixed format;
//! rows labelled with the configured total sentinel are removed by label.
//!
//! Portfolio frames have columns
//! `[instrument, instrument_type, sector, currency, date, <value>]`,
//! benchmark frames have `[sector, date, <value>]`.

use crate::columns::{self, source};
use crate::error::{DataError, Result};
use crate::table::{TableLayout, WideTable};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Options controlling how raw tables are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// chrono format of the date headers (default: `%d.%m.%Y`).
    pub date_format: String,
    /// Identifier label of synthetic aggregate rows (default: `Total`).
    pub total_label: String,
    /// Orientation of the portfolio weight and return tables.
    pub portfolio_layout: TableLayout,
    /// Orientation of the benchmark weight and return tables.
    pub benchmark_layout: TableLayout,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            date_format: "%d.%m.%Y".to_string(),
            total_label: "Total".to_string(),
            portfolio_layout: TableLayout::IdentifiersAsRows,
            benchmark_layout: TableLayout::IdentifiersAsRows,
        }
    }
}

/// Parse a date header under `format`.
pub fn parse_date_header(table: &str, header: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(header.trim(), format).map_err(|_| DataError::InvalidDateHeader {
        table: table.to_string(),
        header: header.to_string(),
        format: format.to_string(),
    })
}

/// Parse the headers at `date_columns` as dates, rejecting repeats.
///
/// A table without any date column is a schema error.
fn parse_date_axis(table: &WideTable, date_columns: &[usize], format: &str) -> Result<Vec<NaiveDate>> {
    if date_columns.is_empty() {
        return Err(DataError::NoDateColumns(table.name().to_string()));
    }

    let mut seen = HashSet::new();
    let mut dates = Vec::with_capacity(date_columns.len());

    for &j in date_columns {
        let date = parse_date_header(table.name(), &table.headers()[j], format)?;
        if !seen.insert(date) {
            return Err(DataError::DuplicateDate {
                table: table.name().to_string(),
                date: date.to_string(),
            });
        }
        dates.push(date);
    }

    Ok(dates)
}

/// Parse a numeric cell; empty cells are missing observations.
///
/// Infinite values are rejected like any other unparsable cell.
fn parse_cell(table: &WideTable, row: usize, column: usize) -> Result<Option<f64>> {
    let raw = table.rows()[row][column].trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(DataError::InvalidCell {
            table: table.name().to_string(),
            row,
            column: table.headers()[column].clone(),
            value: raw.to_string(),
        }),
    }
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Normalize a portfolio weight or return table.
///
/// The table must carry the `Instrument`, `Instr. Type`, `Sector 1` and `Ccy`
/// identifier columns; every other column is a date.
///
/// # Errors
///
/// Returns [`DataError::MissingColumn`] when an identifier column is absent,
/// [`DataError::NoDateColumns`] when nothing else is left, and
/// [`DataError::InvalidDateHeader`] when any other header is not a date.
pub fn normalize_portfolio_table(
    table: &WideTable,
    value_column: &str,
    options: &IngestOptions,
) -> Result<DataFrame> {
    let table = table.oriented(options.portfolio_layout);

    let mut id_positions = [0usize; 4];
    for (slot, header) in id_positions.iter_mut().zip(source::PORTFOLIO_ID_COLUMNS) {
        *slot = table
            .column_index(header)
            .ok_or_else(|| DataError::MissingColumn {
                table: table.name().to_string(),
                column: header.to_string(),
            })?;
    }

    let table = table.without_label(id_positions[0], &options.total_label);

    let date_columns: Vec<usize> = (0..table.headers().len())
        .filter(|j| !id_positions.contains(j))
        .collect();
    let dates = parse_date_axis(&table, &date_columns, &options.date_format)?;

    let capacity = table.height() * dates.len();
    let mut instruments = Vec::with_capacity(capacity);
    let mut types = Vec::with_capacity(capacity);
    let mut sectors = Vec::with_capacity(capacity);
    let mut currencies = Vec::with_capacity(capacity);
    let mut date_values = Vec::with_capacity(capacity);
    let mut values = Vec::with_capacity(capacity);

    for (i, row) in table.rows().iter().enumerate() {
        for (&j, &date) in date_columns.iter().zip(&dates) {
            let Some(value) = parse_cell(&table, i, j)? else {
                continue;
            };
            instruments.push(row[id_positions[0]].trim().to_string());
            types.push(row[id_positions[1]].trim().to_string());
            sectors.push(row[id_positions[2]].trim().to_string());
            currencies.push(row[id_positions[3]].trim().to_string());
            date_values.push(iso(date));
            values.push(value);
        }
    }

    tracing::debug!(
        table = %table.name(),
        instruments = table.height(),
        dates = dates.len(),
        rows = values.len(),
        "Normalized portfolio table"
    );

    let df = DataFrame::new(vec![
        Column::new(columns::INSTRUMENT.into(), instruments),
        Column::new(columns::INSTRUMENT_TYPE.into(), types),
        Column::new(columns::SECTOR.into(), sectors),
        Column::new(columns::CURRENCY.into(), currencies),
        Column::new(columns::DATE.into(), date_values),
        Column::new(value_column.into(), values),
    ])?;

    Ok(df
        .lazy()
        .with_column(col(columns::DATE).cast(DataType::Date))
        .collect()?)
}

/// Normalize a benchmark weight or return table.
///
/// The first column holds the sector label whatever its header; every other
/// column is a date, and there must be at least one.
pub fn normalize_benchmark_table(
    table: &WideTable,
    value_column: &str,
    options: &IngestOptions,
) -> Result<DataFrame> {
    let table = table
        .oriented(options.benchmark_layout)
        .without_label(0, &options.total_label);
    let date_columns: Vec<usize> = (1..table.headers().len()).collect();
    let dates = parse_date_axis(&table, &date_columns, &options.date_format)?;

    let capacity = table.height() * dates.len();
    let mut sectors = Vec::with_capacity(capacity);
    let mut date_values = Vec::with_capacity(capacity);
    let mut values = Vec::with_capacity(capacity);

    for (i, row) in table.rows().iter().enumerate() {
        for (&j, &date) in date_columns.iter().zip(&dates) {
            let Some(value) = parse_cell(&table, i, j)? else {
                continue;
            };
            sectors.push(row[0].trim().to_string());
            date_values.push(iso(date));
            values.push(value);
        }
    }

    tracing::debug!(
        table = %table.name(),
        sectors = table.height(),
        dates = dates.len(),
        rows = values.len(),
        "Normalized benchmark table"
    );

    let df = DataFrame::new(vec![
        Column::new(columns::SECTOR.into(), sectors),
        Column::new(columns::DATE.into(), date_values),
        Column::new(value_column.into(), values),
    ])?;

    Ok(df
        .lazy()
        .with_column(col(columns::DATE).cast(DataType::Date))
        .collect()?)
}

/// Read the `date` column of a frame back as chrono dates.
pub fn date_values(df: &DataFrame) -> Result<Vec<NaiveDate>> {
    let dates = df.column(columns::DATE)?.cast(&DataType::String)?;
    let dates = dates.str()?;

    (0..df.height())
        .map(|row| {
            let raw = dates.get(row).ok_or_else(|| DataError::MissingValue {
                column: columns::DATE.to_string(),
                row,
            })?;
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| DataError::InvalidDateHeader {
                table: "frame".to_string(),
                header: raw.to_string(),
                format: "%Y-%m-%d".to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn table(name: &str, headers: &[&str], rows: &[&[&str]]) -> WideTable {
        WideTable::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    fn portfolio_weights() -> WideTable {
        table(
            "portfolio_weights",
            &["Instrument", "Instr. Type", "Sector 1", "Ccy", "02.01.2024", "03.01.2024"],
            &[
                &["AAA", "Equity", "Energy", "EUR", "0.6", "0.55"],
                &["BBB", "Equity", "Utilities", "EUR", "0.4", ""],
                &["Total", "", "", "", "1.0", "0.55"],
            ],
        )
    }

    #[rstest]
    #[case("31.12.2024", NaiveDate::from_ymd_opt(2024, 12, 31))]
    #[case("01.02.2024", NaiveDate::from_ymd_opt(2024, 2, 1))]
    #[case("2024-02-01", None)]
    #[case("32.01.2024", None)]
    fn test_parse_date_header(#[case] header: &str, #[case] expected: Option<NaiveDate>) {
        let parsed = parse_date_header("t", header, "%d.%m.%Y").ok();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_normalize_portfolio_drops_total_and_empty_cells() {
        let df = normalize_portfolio_table(&portfolio_weights(), columns::WEIGHT, &IngestOptions::default())
            .unwrap();

        // 2 instruments x 2 dates minus one empty cell
        assert_eq!(df.height(), 3);
        let instruments: Vec<_> = df
            .column(columns::INSTRUMENT)
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert!(!instruments.contains(&"Total"));

        let dates = date_values(&df).unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(df.column(columns::DATE).unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn test_normalize_portfolio_missing_column() {
        let t = table(
            "portfolio_weights",
            &["Instrument", "Sector 1", "Ccy", "02.01.2024"],
            &[&["AAA", "Energy", "EUR", "1.0"]],
        );
        let err = normalize_portfolio_table(&t, columns::WEIGHT, &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref column, .. } if column == "Instr. Type"));
    }

    #[test]
    fn test_normalize_rejects_bad_date_header() {
        let t = table(
            "benchmark_weights",
            &["Sector", "02.01.2024", "2024-01-03"],
            &[&["Energy", "0.5", "0.5"]],
        );
        let err = normalize_benchmark_table(&t, columns::WEIGHT, &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::InvalidDateHeader { ref header, .. } if header == "2024-01-03"));
    }

    #[test]
    fn test_normalize_rejects_duplicate_dates() {
        let t = table(
            "benchmark_weights",
            &["Sector", "02.01.2024", "02.01.2024"],
            &[&["Energy", "0.5", "0.5"]],
        );
        let err = normalize_benchmark_table(&t, columns::WEIGHT, &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::DuplicateDate { .. }));
    }

    #[test]
    fn test_normalize_rejects_non_numeric_cell() {
        let t = table("benchmark_returns", &["Sector", "02.01.2024"], &[&["Energy", "n/a"]]);
        let err = normalize_benchmark_table(&t, columns::RETURN, &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::InvalidCell { row: 0, .. }));
    }

    #[test]
    fn test_normalize_benchmark_dates_as_rows() {
        let t = table(
            "benchmark_weights",
            &["Date", "Energy", "Utilities"],
            &[&["02.01.2024", "0.5", "0.5"], &["03.01.2024", "0.6", "0.4"]],
        );
        let options = IngestOptions {
            benchmark_layout: TableLayout::DatesAsRows,
            ..Default::default()
        };

        let df = normalize_benchmark_table(&t, columns::WEIGHT, &options).unwrap();
        assert_eq!(df.height(), 4);
        assert_eq!(
            df.get_column_names(),
            vec![columns::SECTOR, columns::DATE, columns::WEIGHT]
        );
    }

    #[test]
    fn test_normalize_portfolio_without_dates_rejected() {
        let t = table(
            "portfolio_returns",
            &["Instrument", "Instr. Type", "Sector 1", "Ccy"],
            &[&["IA", "Equity", "A", "EUR"]],
        );
        let err = normalize_portfolio_table(&t, columns::RETURN, &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::NoDateColumns(ref name) if name == "portfolio_returns"));
    }

    #[test]
    fn test_normalize_benchmark_without_dates_rejected() {
        let t = table("benchmark_weights", &["Sector"], &[&["Energy"]]);
        let err = normalize_benchmark_table(&t, columns::WEIGHT, &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::NoDateColumns(_)));
    }

    #[rstest]
    #[case("inf")]
    #[case("-inf")]
    #[case("1e400")]
    fn test_normalize_rejects_infinite_cell(#[case] raw: &str) {
        let t = table("benchmark_returns", &["Sector", "02.01.2024"], &[&["Energy", raw]]);
        let err = normalize_benchmark_table(&t, columns::RETURN, &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::InvalidCell { ref value, .. } if value == raw));
    }

    #[test]
    fn test_normalize_portfolio_dates_as_rows() {
        // metadata rows above the date rows, aggregate column at the end
        let t = table(
            "portfolio_weights",
            &["Instrument", "IA", "IB", "Total"],
            &[
                &["Instr. Type", "Equity", "Equity", ""],
                &["Sector 1", "A", "B", ""],
                &["Ccy", "EUR", "USD", ""],
                &["02.01.2024", "0.6", "0.4", "1.0"],
                &["03.01.2024", "0.5", "0.5", "1.0"],
            ],
        );
        let options = IngestOptions {
            portfolio_layout: TableLayout::DatesAsRows,
            ..Default::default()
        };

        let df = normalize_portfolio_table(&t, columns::WEIGHT, &options).unwrap();
        assert_eq!(df.height(), 4);

        let str_values = |name: &str| -> Vec<String> {
            df.column(name)
                .unwrap()
                .str()
                .unwrap()
                .into_no_null_iter()
                .map(str::to_string)
                .collect()
        };
        assert_eq!(str_values(columns::INSTRUMENT), vec!["IA", "IA", "IB", "IB"]);
        assert_eq!(str_values(columns::SECTOR), vec!["A", "A", "B", "B"]);
        assert_eq!(str_values(columns::CURRENCY), vec!["EUR", "EUR", "USD", "USD"]);

        let weights: Vec<f64> = df
            .column(columns::WEIGHT)
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(weights, vec![0.6, 0.5, 0.4, 0.5]);

        let dates = date_values(&df).unwrap();
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }
}
