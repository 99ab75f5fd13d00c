//! Attribution configuration.

use crate::error::{EngineError, Result};
use brinson_data::IngestOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How the per-sector effects are split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectModel {
    /// Allocation, selection weighted by the benchmark weight, and interaction.
    #[default]
    BrinsonFachler,
    /// Allocation and selection weighted by the portfolio weight; interaction is
    /// absorbed into selection and reported as zero.
    FoldedInteraction,
}

impl fmt::Display for EffectModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BrinsonFachler => write!(f, "brinson_fachler"),
            Self::FoldedInteraction => write!(f, "folded_interaction"),
        }
    }
}

impl FromStr for EffectModel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "brinson_fachler" | "three_effect" => Ok(Self::BrinsonFachler),
            "folded_interaction" | "two_effect" => Ok(Self::FoldedInteraction),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown effect model '{other}'"
            ))),
        }
    }
}

/// Which weight is applied to a period's return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightLag {
    /// Weight and return of the same date (weights are start-of-period).
    #[default]
    SameDay,
    /// Weight of the previous observation (weights are end-of-period). The
    /// first observation of each instrument or sector gets weight 0.
    PreviousPeriod,
}

impl fmt::Display for WeightLag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameDay => write!(f, "same_day"),
            Self::PreviousPeriod => write!(f, "previous_period"),
        }
    }
}

impl FromStr for WeightLag {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "same_day" | "none" => Ok(Self::SameDay),
            "previous_period" | "lagged" => Ok(Self::PreviousPeriod),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown weight lag '{other}'"
            ))),
        }
    }
}

/// Configuration for an attribution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    /// How raw tables are read.
    pub ingest: IngestOptions,
    /// Effect decomposition (default: three-effect Brinson-Fachler).
    pub effect_model: EffectModel,
    /// Weight lag for portfolio positions (default: same day).
    pub portfolio_weight_lag: WeightLag,
    /// Weight lag for benchmark sectors (default: same day).
    pub benchmark_weight_lag: WeightLag,
    /// Absolute tolerance of the daily attribution identity (default: 1e-9).
    pub identity_tolerance: f64,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            ingest: IngestOptions::default(),
            effect_model: EffectModel::default(),
            portfolio_weight_lag: WeightLag::default(),
            benchmark_weight_lag: WeightLag::default(),
            identity_tolerance: 1e-9,
        }
    }
}

impl AttributionConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the configuration for values the engine cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for an empty date format or total
    /// label, or a negative or non-finite identity tolerance.
    pub fn validate(&self) -> Result<()> {
        if self.ingest.date_format.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "date_format must not be empty".to_string(),
            ));
        }
        if self.ingest.total_label.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "total_label must not be empty".to_string(),
            ));
        }
        if !self.identity_tolerance.is_finite() || self.identity_tolerance < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "identity_tolerance must be a non-negative number, got {}",
                self.identity_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brinson_data::TableLayout;
    use rstest::rstest;

    #[test]
    fn test_default_config_is_valid() {
        let config = AttributionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ingest.date_format, "%d.%m.%Y");
        assert_eq!(config.effect_model, EffectModel::BrinsonFachler);
        assert_eq!(config.portfolio_weight_lag, WeightLag::SameDay);
    }

    #[test]
    fn test_from_json_partial() {
        let json = r#"{
            "effect_model": "folded_interaction",
            "benchmark_weight_lag": "previous_period",
            "ingest": { "benchmark_layout": "dates_as_rows" }
        }"#;
        let config = AttributionConfig::from_json_str(json).unwrap();

        assert_eq!(config.effect_model, EffectModel::FoldedInteraction);
        assert_eq!(config.benchmark_weight_lag, WeightLag::PreviousPeriod);
        assert_eq!(config.portfolio_weight_lag, WeightLag::SameDay);
        assert_eq!(config.ingest.benchmark_layout, TableLayout::DatesAsRows);
        assert_eq!(config.ingest.total_label, "Total");
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let config = AttributionConfig {
            identity_tolerance: -1.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[rstest]
    #[case("brinson_fachler", EffectModel::BrinsonFachler)]
    #[case("Brinson-Fachler", EffectModel::BrinsonFachler)]
    #[case("two_effect", EffectModel::FoldedInteraction)]
    fn test_effect_model_from_str(#[case] input: &str, #[case] expected: EffectModel) {
        assert_eq!(input.parse::<EffectModel>().unwrap(), expected);
    }

    #[rstest]
    #[case("same_day", WeightLag::SameDay)]
    #[case("previous-period", WeightLag::PreviousPeriod)]
    fn test_weight_lag_from_str(#[case] input: &str, #[case] expected: WeightLag) {
        assert_eq!(input.parse::<WeightLag>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_effect_model() {
        assert!("geometric".parse::<EffectModel>().is_err());
    }
}
