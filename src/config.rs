//! Engine configuration
//!
//! Loaded from a TOML file with `WINPRED_` environment overrides, e.g.
//! `WINPRED_FEATURES__TROPHY_CAP=7000`.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PredictorError, Result};

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub backend: BackendConfig,
    pub features: FeatureConfig,
    pub heuristic: HeuristicConfig,
    pub learned: LearnedConfig,
    pub recommendations: RecommendationConfig,
}

/// Which scoring backend the engine is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Heuristic,
    Learned,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
}

/// Feature normalization constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Trophy count that maps to a trophy factor of 1.0
    pub trophy_cap: f64,
    /// Experience level that maps to an experience factor of 1.0
    pub exp_level_cap: f64,
    /// Fallback for synergy/counter/efficiency when data is missing
    pub neutral_score: f64,
    /// Fallback average elixir cost when the deck is unknown
    pub neutral_elixir_cost: f64,
    /// Battle length used to normalize remaining time
    pub battle_length_secs: f64,
    /// Elixir advantage that saturates the elixir balance feature
    pub max_elixir_advantage: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            trophy_cap: 6000.0,
            exp_level_cap: 14.0,
            neutral_score: 0.5,
            neutral_elixir_cost: 3.5,
            battle_length_secs: 180.0,
            max_elixir_advantage: 5.0,
        }
    }
}

/// Closed-form scorer parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    pub win_rate_weight: f64,
    pub trophy_weight: f64,
    pub tower_shift_weight: f64,
    pub elixir_shift_weight: f64,
    pub min_probability: f64,
    pub max_probability: f64,
    pub version: String,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            win_rate_weight: 0.6,
            trophy_weight: 0.4,
            tower_shift_weight: 0.3,
            elixir_shift_weight: 0.2,
            min_probability: 0.1,
            max_probability: 0.9,
            version: "1.0.0-heuristic".to_string(),
        }
    }
}

/// Learned-model invocation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnedConfig {
    /// Timesteps the model expects; a single observation is zero-padded
    pub sequence_length: usize,
}

impl Default for LearnedConfig {
    fn default() -> Self {
        Self { sequence_length: 50 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub max_items: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self { max_items: 3 }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file plus environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: EngineConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("WINPRED")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        tracing::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Reject values that would break the engine's invariants
    pub fn validate(&self) -> Result<()> {
        let f = &self.features;
        let h = &self.heuristic;

        let numbers = [
            ("features.trophy_cap", f.trophy_cap),
            ("features.exp_level_cap", f.exp_level_cap),
            ("features.neutral_score", f.neutral_score),
            ("features.neutral_elixir_cost", f.neutral_elixir_cost),
            ("features.battle_length_secs", f.battle_length_secs),
            ("features.max_elixir_advantage", f.max_elixir_advantage),
            ("heuristic.win_rate_weight", h.win_rate_weight),
            ("heuristic.trophy_weight", h.trophy_weight),
            ("heuristic.tower_shift_weight", h.tower_shift_weight),
            ("heuristic.elixir_shift_weight", h.elixir_shift_weight),
            ("heuristic.min_probability", h.min_probability),
            ("heuristic.max_probability", h.max_probability),
        ];
        if let Some((name, value)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PredictorError::Config(format!("{} must be finite, got {}", name, value)));
        }

        if f.trophy_cap <= 0.0 || f.exp_level_cap <= 0.0 {
            return Err(PredictorError::Config(
                "trophy_cap and exp_level_cap must be positive".to_string(),
            ));
        }
        if f.battle_length_secs <= 0.0 || f.max_elixir_advantage <= 0.0 {
            return Err(PredictorError::Config(
                "battle_length_secs and max_elixir_advantage must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&f.neutral_score) {
            return Err(PredictorError::Config(format!(
                "neutral_score {} outside [0, 1]",
                f.neutral_score
            )));
        }

        if h.min_probability < 0.0 || h.max_probability > 1.0 || h.min_probability > h.max_probability {
            return Err(PredictorError::Config(format!(
                "invalid probability bounds [{}, {}]",
                h.min_probability, h.max_probability
            )));
        }

        if self.learned.sequence_length == 0 {
            return Err(PredictorError::Config("sequence_length must be at least 1".to_string()));
        }

        if !(1..=3).contains(&self.recommendations.max_items) {
            return Err(PredictorError::Config(format!(
                "max_items {} outside 1..=3",
                self.recommendations.max_items
            )));
        }

        Ok(())
    }
}
