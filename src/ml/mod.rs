//! Win prediction pipeline
//!
//! Provides win probability estimation with:
//! - Feature extraction for pre-battle snapshots and live battle observations
//! - Pluggable scoring backends (heuristic, learned model, ensemble)
//! - Decisiveness-based confidence
//! - Normalized factor attribution
//! - Battle phase classification and strategic recommendations

pub mod backend;
pub mod confidence;
pub mod ensemble;
pub mod factors;
pub mod features;
pub mod heuristic;
pub mod learned;
pub mod phase;
pub mod predictor;
pub mod recommendations;


pub use backend::{Score, ScoringBackend};
pub use confidence::confidence;
pub use ensemble::EnsembleScorer;
pub use factors::{attribute, Factor, FactorWeights};
pub use features::{FeatureExtractor, FeatureKey, FeatureLayout, FeatureSet};
pub use heuristic::HeuristicScorer;
pub use learned::{LearnedScorer, ModelCapability, ModelLoader, StaticLoader};
pub use phase::BattlePhase;
pub use predictor::{BattleAnalysis, PredictionResult, WinPredictor};
pub use recommendations::RecommendationEngine;
