//! Weighted ensemble of scoring backends

use async_trait::async_trait;
use std::sync::Arc;

use super::backend::{Score, ScoringBackend};
use super::features::FeatureSet;
use crate::error::{PredictorError, Result};

/// Ensemble scorer combining multiple backends
pub struct EnsembleScorer {
    members: Vec<(Arc<dyn ScoringBackend>, f64)>, // (backend, weight)
    total_weight: f64,
}

impl EnsembleScorer {
    pub fn new(members: Vec<(Arc<dyn ScoringBackend>, f64)>) -> Result<Self> {
        if members.iter().any(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(PredictorError::Config(
                "ensemble weights must be finite and non-negative".to_string(),
            ));
        }

        let total_weight: f64 = members.iter().map(|(_, w)| w).sum();
        if !total_weight.is_finite() {
            return Err(PredictorError::Config(
                "ensemble weights overflow when summed".to_string(),
            ));
        }
        if total_weight <= 0.0 {
            return Err(PredictorError::Config(
                "ensemble needs at least one member with positive weight".to_string(),
            ));
        }

        Ok(Self {
            members,
            total_weight,
        })
    }
}

#[async_trait]
impl ScoringBackend for EnsembleScorer {
    fn score(&self, features: &FeatureSet) -> Result<Score> {
        let mut probability = 0.0;
        let mut raw_signal = 0.0;

        for (backend, weight) in &self.members {
            let score = backend.score(features)?;
            probability += score.probability * weight;
            raw_signal += score.raw_signal * weight;
        }

        Ok(Score {
            probability: (probability / self.total_weight).clamp(0.0, 1.0),
            raw_signal: raw_signal / self.total_weight,
        })
    }

    fn model_version(&self) -> String {
        let versions: Vec<String> = self.members.iter().map(|(b, _)| b.model_version()).collect();
        format!("ensemble({})", versions.join(","))
    }

    fn is_ready(&self) -> bool {
        self.members.iter().all(|(b, _)| b.is_ready())
    }

    async fn initialize(&self) -> Result<()> {
        for (backend, _) in &self.members {
            backend.initialize().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeuristicConfig, LearnedConfig};
    use crate::ml::features::{FeatureKey, FeatureLayout};
    use crate::ml::heuristic::HeuristicScorer;
    use crate::ml::learned::{LearnedScorer, MockModelCapability, StaticLoader};

    fn features() -> FeatureSet {
        FeatureSet::new()
            .with(FeatureKey::WinRate, 0.5)
            .with(FeatureKey::TrophyFactor, 0.5)
            .with(FeatureKey::TowerBalance, 0.5)
            .with(FeatureKey::ElixirBalance, 0.5)
            .fill_defaults()
    }

    fn learned(output: f64) -> Arc<dyn ScoringBackend> {
        let mut model = MockModelCapability::new();
        model.expect_predict().returning(move |_| Ok(output));
        model.expect_version().return_const("gbdt-3".to_string());
        model
            .expect_feature_layout()
            .return_const(FeatureLayout::VERSION.to_string());
        Arc::new(LearnedScorer::new(
            Box::new(StaticLoader::new(Arc::new(model))),
            LearnedConfig::default(),
        ))
    }

    #[test]
    fn test_rejects_zero_weight() {
        let heuristic: Arc<dyn ScoringBackend> = Arc::new(HeuristicScorer::with_defaults());
        assert!(EnsembleScorer::new(vec![(heuristic, 0.0)]).is_err());
        assert!(EnsembleScorer::new(vec![]).is_err());
    }

    #[test]
    fn test_rejects_overflowing_weights() {
        let a: Arc<dyn ScoringBackend> = Arc::new(HeuristicScorer::with_defaults());
        let b: Arc<dyn ScoringBackend> = Arc::new(HeuristicScorer::with_defaults());
        assert!(matches!(
            EnsembleScorer::new(vec![(a, f64::MAX), (b, f64::MAX)]),
            Err(PredictorError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_weighted_mean() {
        let heuristic: Arc<dyn ScoringBackend> = Arc::new(HeuristicScorer::new(HeuristicConfig {
            version: "h1".to_string(),
            ..Default::default()
        }));
        let ensemble = EnsembleScorer::new(vec![(heuristic, 1.0), (learned(0.8), 3.0)]).unwrap();

        assert!(!ensemble.is_ready());
        ensemble.initialize().await.unwrap();
        assert!(ensemble.is_ready());

        // (0.5 * 1 + 0.8 * 3) / 4
        let score = ensemble.score(&features()).unwrap();
        assert!((score.probability - 0.725).abs() < 1e-9);
        assert_eq!(ensemble.model_version(), "ensemble(h1,gbdt-3)");
    }

    #[test]
    fn test_member_not_ready_propagates() {
        let ensemble = EnsembleScorer::new(vec![(learned(0.8), 1.0)]).unwrap();
        assert_eq!(ensemble.score(&features()), Err(PredictorError::EngineNotReady));
    }
}
