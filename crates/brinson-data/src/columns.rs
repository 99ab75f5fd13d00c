//! Column names shared by every long-format frame in the pipeline.

/// Observation date (polars `Date`).
pub const DATE: &str = "date";
/// Instrument identifier.
pub const INSTRUMENT: &str = "instrument";
/// Instrument type label.
pub const INSTRUMENT_TYPE: &str = "instrument_type";
/// Sector label used as the attribution grouping key.
pub const SECTOR: &str = "sector";
/// Instrument currency.
pub const CURRENCY: &str = "currency";
/// Weight as a fraction of NAV.
pub const WEIGHT: &str = "weight";
/// Simple period return.
pub const RETURN: &str = "return";

/// Portfolio sector weight on a sector-day.
pub const PORTFOLIO_WEIGHT: &str = "portfolio_weight";
/// Portfolio sector performance on a sector-day.
pub const PORTFOLIO_RETURN: &str = "portfolio_return";
/// Portfolio weighted return (contribution to total portfolio return).
pub const PORTFOLIO_WEIGHTED_RETURN: &str = "portfolio_weighted_return";
/// Benchmark sector weight on a sector-day.
pub const BENCHMARK_WEIGHT: &str = "benchmark_weight";
/// Benchmark sector performance on a sector-day.
pub const BENCHMARK_RETURN: &str = "benchmark_return";
/// Benchmark weighted return (contribution to total benchmark return).
pub const BENCHMARK_WEIGHTED_RETURN: &str = "benchmark_weighted_return";

/// Source header names of the portfolio wide tables.
pub mod source {
    /// Instrument identifier header.
    pub const INSTRUMENT: &str = "Instrument";
    /// Instrument type header.
    pub const INSTRUMENT_TYPE: &str = "Instr. Type";
    /// Sector header.
    pub const SECTOR: &str = "Sector 1";
    /// Currency header.
    pub const CURRENCY: &str = "Ccy";

    /// Identifier headers in the order they are read.
    pub const PORTFOLIO_ID_COLUMNS: [&str; 4] = [INSTRUMENT, INSTRUMENT_TYPE, SECTOR, CURRENCY];
}
