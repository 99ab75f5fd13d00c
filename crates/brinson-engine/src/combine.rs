//! Portfolio/benchmark outer join.

use crate::error::{EngineError, Result};
use crate::records::SectorDay;
use brinson_data::{columns, date_values};
use polars::prelude::*;

const VALUE_COLUMNS: [&str; 6] = [
    columns::PORTFOLIO_WEIGHT,
    columns::BENCHMARK_WEIGHT,
    columns::PORTFOLIO_RETURN,
    columns::BENCHMARK_RETURN,
    columns::PORTFOLIO_WEIGHTED_RETURN,
    columns::BENCHMARK_WEIGHTED_RETURN,
];

/// Full outer join of portfolio and benchmark sector frames on date and sector.
///
/// Every (date, sector) pair present on either side yields one row; values
/// missing on one side are filled with 0.0. Rows are sorted by date then sector.
pub fn combine_sector_days(portfolio: &DataFrame, benchmark: &DataFrame) -> Result<DataFrame> {
    let fills: Vec<Expr> = VALUE_COLUMNS
        .iter()
        .map(|name| col(*name).fill_null(lit(0.0)))
        .collect();

    let combined = portfolio
        .clone()
        .lazy()
        .join(
            benchmark.clone().lazy(),
            [col(columns::DATE), col(columns::SECTOR)],
            [col(columns::DATE), col(columns::SECTOR)],
            JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
        )
        .with_columns(fills)
        .select(
            std::iter::once(col(columns::DATE))
                .chain(std::iter::once(col(columns::SECTOR)))
                .chain(VALUE_COLUMNS.iter().map(|name| col(*name)))
                .collect::<Vec<_>>(),
        )
        .sort(
            [columns::DATE, columns::SECTOR],
            SortMultipleOptions::default(),
        )
        .collect()?;

    tracing::debug!(
        portfolio_rows = portfolio.height(),
        benchmark_rows = benchmark.height(),
        sector_days = combined.height(),
        "Combined portfolio and benchmark sectors"
    );

    Ok(combined)
}

/// Read a combined sector frame into typed rows.
pub fn sector_days_from_frame(df: &DataFrame) -> Result<Vec<SectorDay>> {
    let dates = date_values(df)?;
    let sectors = df.column(columns::SECTOR)?.str()?;
    let values = VALUE_COLUMNS
        .iter()
        .map(|name| Ok(df.column(name)?.f64()?.clone()))
        .collect::<Result<Vec<_>>>()?;

    let value = |column: usize, row: usize| -> Result<f64> {
        values[column].get(row).ok_or_else(|| EngineError::MissingValue {
            column: VALUE_COLUMNS[column].to_string(),
            row,
        })
    };

    let mut rows = Vec::with_capacity(df.height());
    for (row, date) in dates.into_iter().enumerate() {
        let sector = sectors.get(row).ok_or_else(|| EngineError::MissingValue {
            column: columns::SECTOR.to_string(),
            row,
        })?;
        rows.push(SectorDay {
            date,
            sector: sector.to_string(),
            portfolio_weight: value(0, row)?,
            benchmark_weight: value(1, row)?,
            portfolio_return: value(2, row)?,
            benchmark_return: value(3, row)?,
            portfolio_weighted_return: value(4, row)?,
            benchmark_weighted_return: value(5, row)?,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn frame(prefix: &str, sectors: &[&str], days: &[&str], values: [&[f64]; 3]) -> DataFrame {
        let (weight, perf, weighted) = if prefix == "portfolio" {
            (
                columns::PORTFOLIO_WEIGHT,
                columns::PORTFOLIO_RETURN,
                columns::PORTFOLIO_WEIGHTED_RETURN,
            )
        } else {
            (
                columns::BENCHMARK_WEIGHT,
                columns::BENCHMARK_RETURN,
                columns::BENCHMARK_WEIGHTED_RETURN,
            )
        };
        DataFrame::new(vec![
            Column::new(columns::DATE.into(), days.to_vec()),
            Column::new(columns::SECTOR.into(), sectors.to_vec()),
            Column::new(weight.into(), values[0].to_vec()),
            Column::new(perf.into(), values[1].to_vec()),
            Column::new(weighted.into(), values[2].to_vec()),
        ])
        .unwrap()
        .lazy()
        .with_column(col(columns::DATE).cast(DataType::Date))
        .collect()
        .unwrap()
    }

    #[test]
    fn test_outer_join_fills_missing_side_with_zero() {
        let portfolio = frame(
            "portfolio",
            &["Energy", "Materials"],
            &["2024-01-02", "2024-01-02"],
            [&[0.6, 0.4], &[0.01, 0.02], &[0.006, 0.008]],
        );
        let benchmark = frame(
            "benchmark",
            &["Energy", "Utilities"],
            &["2024-01-02", "2024-01-02"],
            [&[0.5, 0.5], &[0.01, 0.0], &[0.005, 0.0]],
        );

        let combined = combine_sector_days(&portfolio, &benchmark).unwrap();
        let rows = sector_days_from_frame(&combined).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].sector, "Energy");
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(rows[1].sector, "Materials");
        assert_eq!(rows[1].benchmark_weight, 0.0);
        assert_eq!(rows[2].sector, "Utilities");
        assert_eq!(rows[2].portfolio_weight, 0.0);
        assert_eq!(rows[2].benchmark_weight, 0.5);
    }

    #[test]
    fn test_outer_join_keeps_dates_from_either_side() {
        let portfolio = frame(
            "portfolio",
            &["Energy"],
            &["2024-01-03"],
            [&[1.0], &[0.01], &[0.01]],
        );
        let benchmark = frame(
            "benchmark",
            &["Energy"],
            &["2024-01-02"],
            [&[1.0], &[0.02], &[0.02]],
        );

        let rows = sector_days_from_frame(&combine_sector_days(&portfolio, &benchmark).unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].date < rows[1].date);
        assert_eq!(rows[0].portfolio_weight, 0.0);
        assert_eq!(rows[1].benchmark_return, 0.0);
    }
}
