//! Run configuration from a JSON file plus flag overrides.

use super::CliError;
use brinson_engine::{AttributionConfig, EffectModel, WeightLag};
use std::path::PathBuf;

/// Configuration sources given on the command line.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConfigSources {
    pub(crate) config: Option<PathBuf>,
    pub(crate) effect_model: Option<String>,
    pub(crate) portfolio_lag: Option<String>,
    pub(crate) benchmark_lag: Option<String>,
}

impl ConfigSources {
    /// Load the file (or defaults) and apply the overrides.
    ///
    /// # Errors
    ///
    /// Returns the engine error of an unreadable or invalid config file, or
    /// of an override that names no known model or lag.
    pub(crate) fn resolve(&self) -> Result<AttributionConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration");
                AttributionConfig::from_json_path(path)?
            }
            None => AttributionConfig::default(),
        };

        if let Some(model) = &self.effect_model {
            config.effect_model = model.parse::<EffectModel>()?;
        }
        if let Some(lag) = &self.portfolio_lag {
            config.portfolio_weight_lag = lag.parse::<WeightLag>()?;
        }
        if let Some(lag) = &self.benchmark_lag {
            config.benchmark_weight_lag = lag.parse::<WeightLag>()?;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_without_sources() {
        let config = ConfigSources::default().resolve().unwrap();
        assert_eq!(config, AttributionConfig::default());
    }

    #[rstest]
    #[case("brinson-fachler", EffectModel::BrinsonFachler)]
    #[case("folded_interaction", EffectModel::FoldedInteraction)]
    fn test_effect_model_override(#[case] flag: &str, #[case] expected: EffectModel) {
        let sources = ConfigSources {
            effect_model: Some(flag.to_string()),
            ..Default::default()
        };
        assert_eq!(sources.resolve().unwrap().effect_model, expected);
    }

    #[test]
    fn test_overrides_apply_over_file() {
        let path = std::env::temp_dir().join(format!("brinson_cli_config_{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"effect_model": "folded_interaction", "benchmark_weight_lag": "previous_period"}"#,
        )
        .unwrap();

        let sources = ConfigSources {
            config: Some(path.clone()),
            effect_model: Some("brinson_fachler".to_string()),
            ..Default::default()
        };
        let config = sources.resolve().unwrap();

        assert_eq!(config.effect_model, EffectModel::BrinsonFachler);
        assert_eq!(config.benchmark_weight_lag, WeightLag::PreviousPeriod);
        assert_eq!(config.portfolio_weight_lag, WeightLag::SameDay);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_unknown_lag_rejected() {
        let sources = ConfigSources {
            portfolio_lag: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(matches!(sources.resolve(), Err(CliError::Engine(_))));
    }
}
