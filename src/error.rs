//! Error types for the prediction engine

use thiserror::Error;

/// Prediction engine errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictorError {
    /// A required feature was missing after default-filling (extractor defect)
    #[error("Feature set invalid: missing required feature '{key}'")]
    FeatureSetInvalid { key: String },

    /// The scoring backend has not completed initialization
    #[error("Engine not ready: scoring backend is not initialized")]
    EngineNotReady,

    /// The learned-model capability raised or returned an unusable value
    #[error("Backend invocation failed: {0}")]
    BackendInvocationFailed(String),

    #[error("Backend initialization failed: {0}")]
    Initialization(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl PredictorError {
    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, PredictorError::EngineNotReady | PredictorError::Initialization(_))
    }
}

impl From<config::ConfigError> for PredictorError {
    fn from(err: config::ConfigError) -> Self {
        PredictorError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PredictorError>;
