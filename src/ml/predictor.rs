//! Win Predictor - unified prediction interface
//!
//! Composes feature extraction, scoring, confidence, attribution, battle
//! phase and recommendations into the two supported call shapes:
//! - pre-battle: one-shot estimate from a player snapshot
//! - live: estimate from a single in-battle observation
//!
//! Usage:
//! ```ignore
//! let predictor = WinPredictor::heuristic(EngineConfig::default());
//! let result = predictor.predict_pre_battle(&player, None, None)?;
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::backend::ScoringBackend;
use super::confidence::confidence;
use super::factors::{attribute, FactorWeights};
use super::features::{FeatureExtractor, FeatureSet};
use super::heuristic::HeuristicScorer;
use super::learned::{LearnedScorer, ModelLoader};
use super::phase::BattlePhase;
use super::recommendations::RecommendationEngine;
use crate::config::{BackendKind, EngineConfig};
use crate::error::{PredictorError, Result};
use crate::types::{PreBattleContext, RawBattleContext, RawPlayerSnapshot};

/// Battle state the live prediction was made against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleAnalysis {
    pub battle_time_remaining: i64,
    pub elapsed: i64,
    pub player_towers: u8,
    pub opponent_towers: u8,
    pub elixir_advantage: f64,
    pub current_phase: BattlePhase,
}

impl BattleAnalysis {
    fn new(battle: &RawBattleContext, phase: BattlePhase) -> Self {
        Self {
            battle_time_remaining: battle.time_remaining_secs,
            elapsed: battle.elapsed_secs,
            player_towers: battle.player_towers,
            opponent_towers: battle.opponent_towers,
            elixir_advantage: battle.elixir_advantage,
            current_phase: phase,
        }
    }
}

/// Prediction handed to the caller for persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub win_probability: f64,
    pub confidence: f64,
    pub model_version: String,
    pub influencing_factors: FactorWeights,
    pub recommendations: Vec<String>,
    pub input_features: FeatureSet,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battle_phase: Option<BattlePhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battle_analysis: Option<BattleAnalysis>,
}

impl PredictionResult {
    pub fn is_live(&self) -> bool {
        self.battle_phase.is_some()
    }
}

/// Win prediction engine
///
/// Holds no per-request state; share it behind an `Arc` across tasks.
pub struct WinPredictor {
    extractor: FeatureExtractor,
    backend: Arc<dyn ScoringBackend>,
    recommender: RecommendationEngine,
}

impl WinPredictor {
    pub fn new(config: EngineConfig, backend: Arc<dyn ScoringBackend>) -> Self {
        Self {
            extractor: FeatureExtractor::new(config.features),
            backend,
            recommender: RecommendationEngine::new(config.recommendations),
        }
    }

    /// Engine with the closed-form scorer; always ready
    pub fn heuristic(config: EngineConfig) -> Self {
        let backend = Arc::new(HeuristicScorer::new(config.heuristic.clone()));
        Self::new(config, backend)
    }

    /// Build the backend named in the config
    ///
    /// A learned backend needs a loader and still has to be initialized.
    pub fn from_config(config: EngineConfig, loader: Option<Box<dyn ModelLoader>>) -> Result<Self> {
        config.validate()?;

        match config.backend.kind {
            BackendKind::Heuristic => Ok(Self::heuristic(config)),
            BackendKind::Learned => {
                let loader = loader.ok_or_else(|| {
                    PredictorError::Config("learned backend requires a model loader".to_string())
                })?;
                let backend = Arc::new(LearnedScorer::new(loader, config.learned.clone()));
                Ok(Self::new(config, backend))
            }
        }
    }

    /// Run backend initialization. Safe to call repeatedly or retry.
    pub async fn initialize(&self) -> Result<()> {
        tracing::info!("Initializing win predictor backend");
        self.backend.initialize().await
    }

    pub fn is_ready(&self) -> bool {
        self.backend.is_ready()
    }

    pub fn model_version(&self) -> String {
        self.backend.model_version()
    }

    fn ensure_ready(&self) -> Result<()> {
        if !self.backend.is_ready() {
            return Err(PredictorError::EngineNotReady);
        }
        Ok(())
    }

    /// Pre-battle prediction from a player snapshot
    pub fn predict_pre_battle(
        &self,
        player: &RawPlayerSnapshot,
        opponent: Option<&RawPlayerSnapshot>,
        context: Option<&PreBattleContext>,
    ) -> Result<PredictionResult> {
        self.ensure_ready()?;

        let features = self.extractor.extract(player, opponent, context);
        let score = self.backend.score(&features)?;
        let confidence = confidence(score.raw_signal);
        let factors = attribute(&features);
        let recommendations = self.recommender.recommend(&features, score.probability, None);
        let model_version = self.backend.model_version();

        tracing::debug!(
            "{}: pre-battle win probability {:.3} (confidence {:.3}, model {})",
            player.clean_tag(),
            score.probability,
            confidence,
            model_version
        );

        Ok(PredictionResult {
            win_probability: score.probability,
            confidence,
            model_version,
            influencing_factors: factors,
            recommendations,
            input_features: features,
            timestamp: Utc::now(),
            battle_phase: None,
            battle_analysis: None,
        })
    }

    /// Live prediction from a single battle observation
    pub fn predict_live(&self, player_tag: &str, battle: &RawBattleContext) -> Result<PredictionResult> {
        self.ensure_ready()?;

        let features = self.extractor.extract_live(player_tag, battle);
        let score = self.backend.score(&features)?;
        let confidence = confidence(score.raw_signal);
        let phase = BattlePhase::classify(battle.time_remaining_secs);
        let recommendations = self.recommender.recommend(&features, score.probability, Some(phase));
        let factors = attribute(&features);
        let model_version = self.backend.model_version();

        tracing::debug!(
            "{}: live win probability {:.3} in {} (model {})",
            player_tag,
            score.probability,
            phase,
            model_version
        );

        Ok(PredictionResult {
            win_probability: score.probability,
            confidence,
            model_version,
            influencing_factors: factors,
            recommendations,
            input_features: features,
            timestamp: Utc::now(),
            battle_phase: Some(phase),
            battle_analysis: Some(BattleAnalysis::new(battle, phase)),
        })
    }
}
