//! Isolation Forest Anomaly Scoring for RailGuard
//!
//! ## Overview
//!
//! The streaming engine treats the outlier model as an opaque capability:
//! a feature vector goes in, a raw decision value comes out, and more negative
//! means more abnormal. This crate supplies that capability plus the offline
//! tooling that produces it.
//!
//! ## Why Isolation Forest?
//!
//! 1. **Unsupervised**: tampering is rare and poorly labeled
//! 2. **Fast Inference**: O(trees × log samples) per reading
//! 3. **Compact**: stores split thresholds only, never training data
//!
//! ## Algorithm Overview
//!
//! ```text
//! Normal points: need many random partitions to isolate
//! Anomalies:     isolated after few partitions
//!
//! score_samples(x)     = -2^(-E[h(x)] / c(max_samples))
//! decision_function(x) = score_samples(x) - offset
//! ```
//!
//! `offset` is the contamination percentile of the training scores, so a
//! decision value below zero marks the expected fraction of outliers. The
//! engine applies its own, slightly stricter cutoff of -0.05.
//!
//! ## Pipeline
//!
//! ```text
//! RawRecord ──prepare──▶ TrainingRow ──train──▶ StandardScaler + IsolationForest
//!                                                        │ save (JSON)
//!                                                        ▼
//! FeatureVector ──ForestScorer::score──▶ raw decision value
//! ```
//!
//! The [`windowed`] module is a separate exploratory tool: fixed,
//! non-overlapping windows over a raw accelerometer trace, scored with their
//! own forest. It shares no state with the streaming path.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod artifact;
pub mod forest;
pub mod node;
pub mod prepare;
pub mod scaler;
pub mod scorer;
pub mod scoring;
pub mod training;
pub mod tree;
pub mod windowed;

pub use artifact::{load_model, load_scaler, save_model, save_scaler, ArtifactFile};
pub use forest::{Contamination, ForestConfig, ForestStats, IsolationForest};
pub use node::{Node, NodeType};
pub use prepare::{prepare_features, RawRecord, TrainingRow};
pub use scaler::StandardScaler;
pub use scorer::{ForestScorer, ModelScorer};
pub use scoring::{average_path_length, calculate_anomaly_score, percentile, AnomalyScore};
pub use training::{train, ConfusionMatrix, EvaluationReport, TrainConfig, TrainedModel};
pub use tree::IsolationTree;

use thiserror::Error;

/// Maximum features per sample
pub const MAX_FEATURES: usize = 16;

/// Default subsample size per tree
pub const DEFAULT_SAMPLE_SIZE: usize = 256;

/// Euler-Mascheroni constant, used in harmonic number approximation
pub const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Result type for ML operations
pub type MLResult<T> = Result<T, MLError>;

/// ML errors
#[derive(Debug, Error)]
pub enum MLError {
    /// Not enough samples to fit or evaluate
    #[error("Insufficient data")]
    InsufficientData,

    /// Sample width does not match what the model expects
    #[error("Dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch {
        /// Features the model was fit on
        expected: usize,
        /// Features supplied
        actual: usize,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Training or scoring input contains NaN or infinity
    #[error("Input contains a non-finite value")]
    NonFiniteInput,

    /// Model produced NaN or infinity
    #[error("Model produced a non-finite score")]
    NonFiniteScore,

    /// Artifact on disk does not match this build
    #[error("Incompatible artifact: {0}")]
    IncompatibleArtifact(String),

    /// Reading or writing an artifact failed
    #[error("Artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact JSON could not be encoded or decoded
    #[error("Artifact serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fixed-width feature sample
///
/// Stored inline so trees can copy samples around without allocating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Feature values, only the first `num_features` are meaningful
    pub features: [f64; MAX_FEATURES],
    /// Number of populated features
    pub num_features: usize,
}

impl Sample {
    /// Create a sample from a slice of feature values
    pub fn new(values: &[f64]) -> MLResult<Self> {
        if values.is_empty() || values.len() > MAX_FEATURES {
            return Err(MLError::DimensionMismatch {
                expected: MAX_FEATURES,
                actual: values.len(),
            });
        }

        let mut features = [0.0; MAX_FEATURES];
        features[..values.len()].copy_from_slice(values);

        Ok(Self {
            features,
            num_features: values.len(),
        })
    }

    /// Get a feature by index
    pub fn get_feature(&self, index: usize) -> Option<f64> {
        if index < self.num_features {
            Some(self.features[index])
        } else {
            None
        }
    }

    /// Populated features
    pub fn as_slice(&self) -> &[f64] {
        &self.features[..self.num_features]
    }
}

/// Check that every sample has the same width, returning it
pub(crate) fn common_width(samples: &[Sample]) -> MLResult<usize> {
    let first = samples.first().ok_or(MLError::InsufficientData)?;
    let width = first.num_features;

    match samples.iter().find(|s| s.num_features != width) {
        Some(bad) => Err(MLError::DimensionMismatch {
            expected: width,
            actual: bad.num_features,
        }),
        None => Ok(width),
    }
}
