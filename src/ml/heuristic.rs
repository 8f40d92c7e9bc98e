//! Closed-form heuristic scorer

use async_trait::async_trait;
use rand::Rng;

use super::backend::{require_all, Score, ScoringBackend};
use super::features::{FeatureKey, FeatureSet};
use crate::config::HeuristicConfig;
use crate::error::{PredictorError, Result};

const REQUIRED: [FeatureKey; 4] = [
    FeatureKey::WinRate,
    FeatureKey::TrophyFactor,
    FeatureKey::TowerBalance,
    FeatureKey::ElixirBalance,
];

/// Weighted blend of career win rate and trophy standing
///
/// Live feature sets shift the blend by the tower and elixir balance. For
/// pre-battle sets both balances sit at 0.5 and the shift is zero.
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    config: HeuristicConfig,
    min_probability: f64,
    max_probability: f64,
}

impl HeuristicScorer {
    /// Non-finite bounds fall back to 0 and 1; inverted bounds collapse to the minimum.
    pub fn new(config: HeuristicConfig) -> Self {
        let min_probability = finite_or(config.min_probability, 0.0).clamp(0.0, 1.0);
        let max_probability = finite_or(config.max_probability, 1.0).clamp(min_probability, 1.0);
        Self {
            config,
            min_probability,
            max_probability,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(HeuristicConfig::default())
    }

    fn blend(&self, features: &FeatureSet) -> Result<f64> {
        require_all(features, &REQUIRED)?;

        let base = features.get(FeatureKey::WinRate) * self.config.win_rate_weight
            + features.get(FeatureKey::TrophyFactor) * self.config.trophy_weight;

        let live_shift = self.config.tower_shift_weight * (features.get(FeatureKey::TowerBalance) - 0.5)
            + self.config.elixir_shift_weight * (features.get(FeatureKey::ElixirBalance) - 0.5);

        Ok(base + live_shift)
    }

    fn bound(&self, signal: f64) -> f64 {
        signal.clamp(self.min_probability, self.max_probability)
    }

    /// Score with explicit, caller-supplied noise of +/- `amplitude`
    ///
    /// Never used on the default path. Seed the RNG for reproducible runs.
    pub fn score_with_noise<R: Rng>(
        &self,
        features: &FeatureSet,
        rng: &mut R,
        amplitude: f64,
    ) -> Result<Score> {
        if !amplitude.is_finite() {
            return Err(PredictorError::Config(format!(
                "noise amplitude must be finite, got {}",
                amplitude
            )));
        }

        let signal = self.blend(features)?;
        let amplitude = amplitude.abs();
        let noise = if amplitude > 0.0 {
            rng.random_range(-amplitude..=amplitude)
        } else {
            0.0
        };
        let raw_signal = signal + noise;

        Ok(Score {
            probability: self.bound(raw_signal),
            raw_signal,
        })
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[async_trait]
impl ScoringBackend for HeuristicScorer {
    fn score(&self, features: &FeatureSet) -> Result<Score> {
        let raw_signal = self.blend(features)?;
        Ok(Score {
            probability: self.bound(raw_signal),
            raw_signal,
        })
    }

    fn model_version(&self) -> String {
        self.config.version.clone()
    }
}
