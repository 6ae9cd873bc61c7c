//! Engine errors
//!
//! Only construction and configuration surface these to callers. Per-request
//! failures are folded into the safe default response by
//! [`DecisionEngine::process`](crate::DecisionEngine::process).

use railguard_core::ValidationError;
use railguard_ml::MLError;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Reading carries a value the feature path cannot use
    #[error("Invalid reading: {0}")]
    Validation(#[from] ValidationError),

    /// Scaler or model failed on a feature vector
    #[error("Model scoring failed: {0}")]
    Model(#[from] MLError),

    /// Model scorer panicked mid-request
    #[error("Model scorer panicked")]
    ScorerPanicked,

    /// Configuration could not be parsed or is out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
