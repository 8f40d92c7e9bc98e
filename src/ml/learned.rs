//! Learned-model scorer
//!
//! Wraps an externally trained model behind the [`ScoringBackend`] contract.
//! The engine never trains or deserializes weights itself; a [`ModelLoader`]
//! hands over a ready [`ModelCapability`] during initialization.
//!
//! Input layout: one row of features in [`FeatureLayout`] order, padded with
//! zero rows to `sequence_length` timesteps, flattened row-major.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::backend::{Score, ScoringBackend};
use super::features::{FeatureLayout, FeatureSet};
use crate::config::LearnedConfig;
use crate::error::{PredictorError, Result};

const UNINITIALIZED_VERSION: &str = "uninitialized";

/// Opaque pre-trained model
#[cfg_attr(test, mockall::automock)]
pub trait ModelCapability: Send + Sync {
    /// Scalar win probability for a flattened input sequence
    fn predict(&self, input: &[f64]) -> std::result::Result<f64, String>;

    /// Model revision, reported verbatim in prediction results
    fn version(&self) -> String;

    /// Feature layout version the model was trained against
    fn feature_layout(&self) -> String;
}

/// Produces a model capability during engine initialization
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn ModelCapability>>;
}

/// Loader for a capability the caller already holds
pub struct StaticLoader {
    model: Arc<dyn ModelCapability>,
}

impl StaticLoader {
    pub fn new(model: Arc<dyn ModelCapability>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl ModelLoader for StaticLoader {
    async fn load(&self) -> Result<Arc<dyn ModelCapability>> {
        Ok(self.model.clone())
    }
}

/// Lay rows out as a fixed-length sequence, zero-padded or truncated
pub fn to_sequence(rows: &[Vec<f64>], sequence_length: usize, width: usize) -> Vec<f64> {
    let mut input = Vec::with_capacity(sequence_length * width);
    for row in rows.iter().take(sequence_length) {
        input.extend(row.iter().copied().chain(std::iter::repeat(0.0)).take(width));
    }
    input.resize(sequence_length * width, 0.0);
    input
}

/// Scorer backed by an external model
pub struct LearnedScorer {
    loader: Box<dyn ModelLoader>,
    model: OnceCell<Arc<dyn ModelCapability>>,
    sequence_length: usize,
}

impl LearnedScorer {
    pub fn new(loader: Box<dyn ModelLoader>, config: LearnedConfig) -> Self {
        Self {
            loader,
            model: OnceCell::new(),
            sequence_length: config.sequence_length.max(1),
        }
    }

    /// Flattened model input for a feature set
    pub fn model_input(&self, features: &FeatureSet) -> Vec<f64> {
        to_sequence(&[features.to_vector()], self.sequence_length, FeatureLayout::width())
    }

    async fn load_checked(&self) -> Result<Arc<dyn ModelCapability>> {
        let model = self.loader.load().await?;
        let layout = model.feature_layout();
        if layout != FeatureLayout::VERSION {
            return Err(PredictorError::Initialization(format!(
                "model {} expects feature layout '{}', engine provides '{}'",
                model.version(),
                layout,
                FeatureLayout::VERSION
            )));
        }
        Ok(model)
    }
}

#[async_trait]
impl ScoringBackend for LearnedScorer {
    fn score(&self, features: &FeatureSet) -> Result<Score> {
        let model = self.model.get().ok_or(PredictorError::EngineNotReady)?;
        features.validate()?;

        let input = self.model_input(features);
        let raw_signal = model
            .predict(&input)
            .map_err(PredictorError::BackendInvocationFailed)?;

        if !raw_signal.is_finite() {
            return Err(PredictorError::BackendInvocationFailed(format!(
                "model {} returned non-finite output {}",
                model.version(),
                raw_signal
            )));
        }

        let probability = raw_signal.clamp(0.0, 1.0);
        if probability != raw_signal {
            tracing::warn!(
                "Model {} output {} outside [0, 1], clamped to {}",
                model.version(),
                raw_signal,
                probability
            );
        }

        Ok(Score {
            probability,
            raw_signal,
        })
    }

    fn model_version(&self) -> String {
        self.model
            .get()
            .map(|m| m.version())
            .unwrap_or_else(|| UNINITIALIZED_VERSION.to_string())
    }

    fn is_ready(&self) -> bool {
        self.model.initialized()
    }

    async fn initialize(&self) -> Result<()> {
        let model = self.model.get_or_try_init(|| self.load_checked()).await?;
        tracing::info!("Learned scorer ready: model {}", model.version());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::features::FeatureKey;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn mock_model(output: f64) -> MockModelCapability {
        let mut model = MockModelCapability::new();
        model.expect_predict().returning(move |_| Ok(output));
        model.expect_version().return_const("lstm-2.1.0".to_string());
        model
            .expect_feature_layout()
            .return_const(FeatureLayout::VERSION.to_string());
        model
    }

    fn scorer_with(model: MockModelCapability) -> LearnedScorer {
        LearnedScorer::new(
            Box::new(StaticLoader::new(Arc::new(model))),
            LearnedConfig::default(),
        )
    }

    fn features() -> FeatureSet {
        FeatureSet::new()
            .with(FeatureKey::WinRate, 0.6)
            .with(FeatureKey::TrophyFactor, 0.4)
            .fill_defaults()
    }

    /// Fails on the first attempt, succeeds afterwards
    struct FlakyLoader {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl ModelLoader for FlakyLoader {
        async fn load(&self) -> Result<Arc<dyn ModelCapability>> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(PredictorError::Initialization("weights unavailable".to_string()));
            }
            Ok(Arc::new(mock_model(0.5)))
        }
    }

    #[test]
    fn test_to_sequence_pads_and_truncates() {
        let padded = to_sequence(&[vec![1.0, 2.0]], 3, 2);
        assert_eq!(padded, vec![1.0, 2.0, 0.0, 0.0, 0.0, 0.0]);

        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let truncated = to_sequence(&rows, 2, 2);
        assert_eq!(truncated, vec![1.0, 2.0, 3.0, 4.0]);

        let short_row = to_sequence(&[vec![7.0]], 1, 3);
        assert_eq!(short_row, vec![7.0, 0.0, 0.0]);
    }

    #[test]
    fn test_score_before_initialize_is_not_ready() {
        let scorer = scorer_with(mock_model(0.7));
        assert!(!scorer.is_ready());
        assert_eq!(scorer.model_version(), "uninitialized");
        assert_eq!(scorer.score(&features()), Err(PredictorError::EngineNotReady));
    }

    #[tokio::test]
    async fn test_score_after_initialize() {
        let scorer = scorer_with(mock_model(0.7));
        scorer.initialize().await.unwrap();

        assert!(scorer.is_ready());
        assert_eq!(scorer.model_version(), "lstm-2.1.0");
        let score = scorer.score(&features()).unwrap();
        assert_eq!(score.probability, 0.7);
        assert_eq!(score.raw_signal, 0.7);
    }

    #[tokio::test]
    async fn test_model_receives_fixed_length_input() {
        let mut model = MockModelCapability::new();
        model
            .expect_predict()
            .withf(|input| {
                input.len() == 50 * FeatureLayout::width()
                    && input[0] == 0.6
                    && input[1] == 0.4
                    && input[FeatureLayout::width()..].iter().all(|v| *v == 0.0)
            })
            .times(1)
            .returning(|_| Ok(0.55));
        model.expect_version().return_const("lstm-2.1.0".to_string());
        model
            .expect_feature_layout()
            .return_const(FeatureLayout::VERSION.to_string());

        let scorer = scorer_with(model);
        scorer.initialize().await.unwrap();
        assert_eq!(scorer.score(&features()).unwrap().probability, 0.55);
    }

    #[tokio::test]
    async fn test_out_of_range_output_is_clamped() {
        let scorer = scorer_with(mock_model(1.3));
        scorer.initialize().await.unwrap();

        let score = scorer.score(&features()).unwrap();
        assert_eq!(score.probability, 1.0);
        assert_eq!(score.raw_signal, 1.3);
    }

    #[tokio::test]
    async fn test_nan_output_fails() {
        let scorer = scorer_with(mock_model(f64::NAN));
        scorer.initialize().await.unwrap();

        assert!(matches!(
            scorer.score(&features()),
            Err(PredictorError::BackendInvocationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_model_error_is_reported() {
        let mut model = MockModelCapability::new();
        model
            .expect_predict()
            .returning(|_| Err("tensor shape mismatch".to_string()));
        model.expect_version().return_const("lstm-2.1.0".to_string());
        model
            .expect_feature_layout()
            .return_const(FeatureLayout::VERSION.to_string());

        let scorer = scorer_with(model);
        scorer.initialize().await.unwrap();
        assert_eq!(
            scorer.score(&features()),
            Err(PredictorError::BackendInvocationFailed(
                "tensor shape mismatch".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_missing_feature_fails_fast() {
        let scorer = scorer_with(mock_model(0.5));
        scorer.initialize().await.unwrap();

        let partial = FeatureSet::new().with(FeatureKey::WinRate, 0.5);
        assert!(matches!(
            scorer.score(&partial),
            Err(PredictorError::FeatureSetInvalid { .. })
        ));
    }

    #[tokio::test]
    async fn test_layout_mismatch_fails_initialization() {
        let mut model = MockModelCapability::new();
        model.expect_version().return_const("lstm-0.9.0".to_string());
        model.expect_feature_layout().return_const("fs-v0".to_string());

        let scorer = scorer_with(model);
        let err = scorer.initialize().await.unwrap_err();
        assert!(matches!(err, PredictorError::Initialization(_)));
        assert!(!scorer.is_ready());
    }

    #[tokio::test]
    async fn test_initialize_is_retryable_and_idempotent() {
        let scorer = LearnedScorer::new(
            Box::new(FlakyLoader {
                attempts: AtomicUsize::new(0),
            }),
            LearnedConfig::default(),
        );

        assert!(scorer.initialize().await.is_err());
        assert!(!scorer.is_ready());

        scorer.initialize().await.unwrap();
        scorer.initialize().await.unwrap();
        assert!(scorer.is_ready());
        assert_eq!(scorer.model_version(), "lstm-2.1.0");
    }
}
