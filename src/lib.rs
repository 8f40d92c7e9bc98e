//! Win Predictor
//!
//! Estimates a player's probability of winning a match, before the battle or
//! while it is in progress, and explains the estimate.
//!
//! ## Architecture
//!
//! ```text
//! Raw snapshot / battle → FeatureExtractor → FeatureSet → ScoringBackend → Confidence
//!                                                 ↓                ↓
//!                                        FactorAttributor   BattlePhase (live)
//!                                                 ↓                ↓
//!                                           RecommendationEngine → PredictionResult
//! ```

pub mod config;
pub mod error;
pub mod ml;
pub mod types;

pub use crate::config::EngineConfig;
pub use crate::error::{PredictorError, Result};
pub use crate::ml::{PredictionResult, WinPredictor};
