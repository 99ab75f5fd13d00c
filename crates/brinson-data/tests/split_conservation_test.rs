//! Integration tests for normalization and multi-industry splitting

use approx::assert_relative_eq;
use brinson_data::{
    IngestOptions, SplitMatrix, WideTable, columns, normalize_portfolio_table, split_returns,
    split_weights,
};
use polars::prelude::*;
use std::collections::HashMap;

const WEIGHTS: &str = "\
Instrument,Instr. Type,Sector 1,Ccy,02.01.2024,03.01.2024
CONG,Equity,Energy,EUR,0.5,0.45
SOLO,Equity,Utilities,EUR,0.5,0.55
Total,,,,1.0,1.0
";

const RETURNS: &str = "\
Instrument,Instr. Type,Sector 1,Ccy,02.01.2024,03.01.2024
CONG,Equity,Energy,EUR,0.01,0.02
SOLO,Equity,Utilities,EUR,-0.01,0.005
";

const SPLIT: &str = "\
Instrument,Energy,Utilities,Materials
CONG,0.6,0.3,0.1
";

fn load(name: &str, csv: &str, value: &str) -> DataFrame {
    let table = WideTable::from_csv_reader(name, csv.as_bytes()).unwrap();
    normalize_portfolio_table(&table, value, &IngestOptions::default()).unwrap()
}

fn matrix() -> SplitMatrix {
    let table = WideTable::from_csv_reader("multi_industry", SPLIT.as_bytes()).unwrap();
    SplitMatrix::from_table(&table, "Total").unwrap()
}

fn weight_by_instrument_prefix(df: &DataFrame) -> HashMap<(String, String), f64> {
    let instruments = df.column(columns::INSTRUMENT).unwrap().str().unwrap().clone();
    let dates = df.column(columns::DATE).unwrap().cast(&DataType::String).unwrap();
    let dates = dates.str().unwrap();
    let weights = df.column(columns::WEIGHT).unwrap().f64().unwrap();

    let mut totals = HashMap::new();
    for i in 0..df.height() {
        let instrument = instruments.get(i).unwrap();
        let base = instrument.split(" - ").next().unwrap().to_string();
        *totals
            .entry((base, dates.get(i).unwrap().to_string()))
            .or_insert(0.0) += weights.get(i).unwrap();
    }
    totals
}

#[test]
fn test_split_conserves_weight_per_instrument_and_date() {
    let weights = load("portfolio_weights", WEIGHTS, columns::WEIGHT);
    let split = split_weights(&weights, &matrix(), columns::WEIGHT).unwrap();

    // CONG becomes three rows per date, SOLO stays one
    assert_eq!(split.height(), 8);

    let before = weight_by_instrument_prefix(&weights);
    let after = weight_by_instrument_prefix(&split);
    assert_eq!(before.len(), after.len());
    for (key, weight) in &before {
        assert_relative_eq!(after[key], *weight, epsilon = 1e-12);
    }
}

#[test]
fn test_split_rows_use_composite_identifier_and_target_sector() {
    let weights = load("portfolio_weights", WEIGHTS, columns::WEIGHT);
    let split = split_weights(&weights, &matrix(), columns::WEIGHT).unwrap();

    let rows = split
        .lazy()
        .filter(col(columns::INSTRUMENT).eq(lit("CONG - Materials")))
        .collect()
        .unwrap();
    assert_eq!(rows.height(), 2);

    let sectors = rows.column(columns::SECTOR).unwrap().str().unwrap();
    assert_eq!(sectors.get(0), Some("Materials"));
    let weights = rows.column(columns::WEIGHT).unwrap().f64().unwrap();
    assert_relative_eq!(weights.get(0).unwrap(), 0.05, epsilon = 1e-12);
    assert_relative_eq!(weights.get(1).unwrap(), 0.045, epsilon = 1e-12);
}

#[test]
fn test_split_returns_are_replicated_unscaled() {
    let returns = load("portfolio_returns", RETURNS, columns::RETURN);
    let split = split_returns(&returns, &matrix(), columns::RETURN).unwrap();

    let rows = split
        .lazy()
        .filter(col(columns::INSTRUMENT).eq(lit("CONG - Utilities")))
        .collect()
        .unwrap();
    let values: Vec<f64> = rows
        .column(columns::RETURN)
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(values, vec![0.01, 0.02]);
}

#[test]
fn test_empty_matrix_is_identity() {
    let weights = load("portfolio_weights", WEIGHTS, columns::WEIGHT);
    let split = split_weights(&weights, &SplitMatrix::default(), columns::WEIGHT).unwrap();
    assert!(split.equals(&weights));
}
