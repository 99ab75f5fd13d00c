#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/brinson/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod columns;
pub mod error;
pub mod normalize;
pub mod split;
pub mod table;

pub use error::{DataError, Result};
pub use normalize::{
    IngestOptions, date_values, normalize_benchmark_table, normalize_portfolio_table,
    parse_date_header,
};
pub use split::{SplitEntry, SplitMatrix, composite_identifier, split_returns, split_weights};
pub use table::{TableLayout, WideTable};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
