//! Scoring backend capability
//!
//! Every scorer turns a [`FeatureSet`] into a win probability. The backend is
//! picked when the engine is built and shared immutably across requests.

use async_trait::async_trait;

use super::features::{FeatureKey, FeatureSet};
use crate::error::Result;

/// Output of a single scoring call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// Win probability, always within [0, 1]
    pub probability: f64,
    /// Backend signal before clamping
    pub raw_signal: f64,
}

/// Trait for win probability scorers
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    /// Score a feature set
    fn score(&self, features: &FeatureSet) -> Result<Score>;

    /// Identifies the backend variant and revision
    fn model_version(&self) -> String;

    /// Whether `score` may be called
    fn is_ready(&self) -> bool {
        true
    }

    /// Complete any loading work. Idempotent.
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }
}

/// Features every backend reads; checked before scoring
pub(crate) fn require_all(features: &FeatureSet, keys: &[FeatureKey]) -> Result<()> {
    for key in keys {
        features.require(*key)?;
    }
    Ok(())
}
