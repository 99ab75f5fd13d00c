#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/brinson/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aggregate;
pub mod combine;
pub mod compounding;
pub mod config;
pub mod effects;
pub mod error;
pub mod inputs;
pub mod pipeline;
pub mod records;
pub mod redistribute;

pub use compounding::{
    CompoundedChange, LinkedAttribution, LinkedPoint, LinkedTotals, SectorLinkedEffects,
    SectorWeightAverage, calculate_compounded_change, carino_coefficients, normalize_to_first,
};
pub use config::{AttributionConfig, EffectModel, WeightLag};
pub use error::{EngineError, Result};
pub use inputs::{AttributionInputs, InputTable};
pub use pipeline::{
    AttributionEngine, AttributionResult, JoinReports, NormalizedInputs, RedistributionLedger,
};
pub use records::{DailyAttribution, EffectTriple, JoinReport, SectorAttribution, SectorDay};
pub use redistribute::{CarriedReturn, DiscardedReturn, Redistribution};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
