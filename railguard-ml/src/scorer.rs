//! Inference interface consumed by the decision engine
//!
//! The engine only knows [`ModelScorer`]: feature vector in, raw decision
//! value out, lower meaning more abnormal. [`ForestScorer`] is the production
//! implementation; tests substitute their own.

use std::path::Path;

use railguard_core::{FeatureVector, FEATURE_COUNT};

use crate::{artifact, IsolationForest, MLError, MLResult, StandardScaler};

/// Outlier model behind the streaming engine
pub trait ModelScorer: Send + Sync {
    /// Raw decision value for a feature vector
    fn score(&self, features: &FeatureVector) -> MLResult<f64>;
}

/// Standard scaler followed by an isolation forest
#[derive(Debug, Clone)]
pub struct ForestScorer {
    scaler: StandardScaler,
    forest: IsolationForest,
}

impl ForestScorer {
    /// Pair a scaler with a forest, both fit on the streaming columns
    pub fn new(scaler: StandardScaler, forest: IsolationForest) -> MLResult<Self> {
        for actual in [scaler.num_features(), forest.num_features()] {
            if actual != FEATURE_COUNT {
                return Err(MLError::DimensionMismatch {
                    expected: FEATURE_COUNT,
                    actual,
                });
            }
        }

        Ok(Self { scaler, forest })
    }

    /// Load both artifacts from disk
    pub fn load(model_path: impl AsRef<Path>, scaler_path: impl AsRef<Path>) -> MLResult<Self> {
        let forest = artifact::load_model(model_path)?;
        let scaler = artifact::load_scaler(scaler_path)?;
        Self::new(scaler, forest)
    }

    /// Scaler half of the pair
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Forest half of the pair
    pub fn forest(&self) -> &IsolationForest {
        &self.forest
    }
}

impl ModelScorer for ForestScorer {
    fn score(&self, features: &FeatureVector) -> MLResult<f64> {
        let scaled = self.scaler.transform(&features.to_array())?;
        let raw = self.forest.decision_function(&scaled)?;

        if raw.is_finite() {
            Ok(raw)
        } else {
            Err(MLError::NonFiniteScore)
        }
    }
}
