#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/brinson/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export main types from sub-crates
pub use brinson_data as data;
pub use brinson_engine as engine;
pub use brinson_output as output;

// Re-export the types needed for a full run
pub use brinson_data::{IngestOptions, SplitMatrix, TableLayout, WideTable};
pub use brinson_engine::{
    AttributionConfig, AttributionEngine, AttributionInputs, AttributionResult, EffectModel,
    EngineError, InputTable, WeightLag,
};
pub use brinson_output::{AttributionSummary, AttributionWorkbook, ExportFormat, Exporter};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
