use ab_analysis_core::Alternative;
use ab_analysis_stats::{CorrectionMethod, Scenario, DEFAULT_POSTERIOR_SAMPLES, DEFAULT_SEED};
use anyhow::{Context as _, Result};
use config::{Config as ConfigLoader, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

pub const ENV_PREFIX: &str = "AB_ANALYSIS";

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default)]
    #[validate(nested)]
    pub experiment: ExperimentSettings,

    #[serde(default)]
    #[validate(nested)]
    pub bayesian: BayesianSettings,

    #[serde(default)]
    #[validate(nested)]
    pub scenarios: Vec<ScenarioSettings>,

    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct ExperimentSettings {
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub alpha: f64,
    pub alternative: Alternative,
    /// Planning baseline; the observed control rate is used when unset.
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub baseline_rate: Option<f64>,
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub mde: f64,
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub power: f64,
    pub correction: CorrectionMethod,
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub srm_threshold: f64,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            alternative: Alternative::TwoSided,
            baseline_rate: None,
            mde: 0.01,
            power: 0.8,
            correction: CorrectionMethod::Bonferroni,
            srm_threshold: ab_analysis_stats::DEFAULT_SRM_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct BayesianSettings {
    #[validate(range(exclusive_min = 0.0))]
    pub prior_alpha: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub prior_beta: f64,
    #[validate(range(min = 1, max = 10_000_000))]
    pub n_samples: usize,
    pub seed: u64,
}

impl Default for BayesianSettings {
    fn default() -> Self {
        Self {
            prior_alpha: 1.0,
            prior_beta: 1.0,
            n_samples: DEFAULT_POSTERIOR_SAMPLES,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ScenarioSettings {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub monthly_visitors: u64,
    pub revenue_per_conversion: Decimal,
    #[validate(range(min = 0.0, max = 1.0))]
    pub rollout_percentage: f64,
}

impl From<&ScenarioSettings> for Scenario {
    fn from(settings: &ScenarioSettings) -> Self {
        Scenario::new(
            settings.name.clone(),
            settings.monthly_visitors,
            settings.revenue_per_conversion,
            settings.rollout_percentage,
        )
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AnalysisConfig {
    /// Layers `config/default`, `config/local`, an optional explicit file and
    /// `AB_ANALYSIS__*` environment variables, later sources winning.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to assemble configuration sources")?;

        let loaded: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        loaded.check()?;
        Ok(loaded)
    }

    pub fn check(&self) -> Result<()> {
        self.validate().context("Invalid configuration")?;
        Ok(())
    }

    pub fn scenarios(&self) -> Vec<Scenario> {
        self.scenarios.iter().map(Scenario::from).collect()
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            experiment: ExperimentSettings::default(),
            bayesian: BayesianSettings::default(),
            scenarios: vec![
                ScenarioSettings {
                    name: "conservative".to_string(),
                    monthly_visitors: 100_000,
                    revenue_per_conversion: Decimal::new(5000, 2),
                    rollout_percentage: 0.5,
                },
                ScenarioSettings {
                    name: "full_rollout".to_string(),
                    monthly_visitors: 100_000,
                    revenue_per_conversion: Decimal::new(5000, 2),
                    rollout_percentage: 1.0,
                },
            ],
            log_level: default_log_level(),
        }
    }
}
