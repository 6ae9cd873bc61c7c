//! Isolation Forest implementation
//!
//! Combines many isolation trees, each grown on a random subsample drawn
//! without replacement, and places the decision boundary from the
//! contamination level observed during training.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::{
    calculate_anomaly_score, percentile, AnomalyScore, IsolationTree, MLError, MLResult, Sample,
    DEFAULT_SAMPLE_SIZE,
};

/// Expected share of outliers in the training data
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contamination {
    /// Fixed offset of -0.5 (boundary at the neutral score)
    Auto,
    /// Fraction in (0, 0.5]
    Fraction(f64),
}

/// Configuration for Isolation Forest
#[derive(Debug, Clone)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub num_trees: usize,
    /// Upper bound on the subsample size for each tree
    pub max_samples: usize,
    /// Contamination used to place the decision boundary
    pub contamination: Contamination,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_samples: DEFAULT_SAMPLE_SIZE,
            contamination: Contamination::Auto,
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Settings of the streaming tamper model
    pub fn tamper_model(contamination: Contamination) -> Self {
        Self {
            num_trees: 300,
            contamination,
            ..Self::default()
        }
    }

    /// Settings of the exploratory windowed analysis
    pub fn windowed() -> Self {
        Self {
            num_trees: 200,
            contamination: Contamination::Fraction(0.05),
            ..Self::default()
        }
    }

    fn validate(&self) -> MLResult<()> {
        if self.num_trees == 0 {
            return Err(MLError::InvalidConfig("num_trees must be positive"));
        }
        if self.max_samples == 0 {
            return Err(MLError::InvalidConfig("max_samples must be positive"));
        }
        if let Contamination::Fraction(fraction) = self.contamination {
            if !(fraction > 0.0 && fraction <= 0.5) {
                return Err(MLError::InvalidConfig("contamination must be in (0, 0.5]"));
            }
        }
        Ok(())
    }
}

/// Fitted Isolation Forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    /// Individual trees
    trees: Vec<IsolationTree>,
    /// Subsample size each tree was grown on, the path-length normalizer
    max_samples: usize,
    /// Features per sample
    num_features: usize,
    /// Subtracted from `score_samples` to center the decision boundary on 0
    offset: f64,
}

impl IsolationForest {
    /// Train the forest on samples
    pub fn fit(samples: &[Sample], config: &ForestConfig) -> MLResult<Self> {
        config.validate()?;
        let num_features = crate::common_width(samples)?;

        if samples.iter().any(|s| s.as_slice().iter().any(|v| !v.is_finite())) {
            return Err(MLError::NonFiniteInput);
        }

        let max_samples = config.max_samples.min(samples.len());
        let max_depth = (max_samples.max(2) as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut trees = Vec::with_capacity(config.num_trees);
        for _ in 0..config.num_trees {
            let subset: Vec<Sample> = rand::seq::index::sample(&mut rng, samples.len(), max_samples)
                .into_iter()
                .map(|i| samples[i])
                .collect();

            trees.push(IsolationTree::fit(&subset, max_depth, &mut rng)?);
        }

        let mut forest = Self {
            trees,
            max_samples,
            num_features,
            offset: -0.5,
        };

        if let Contamination::Fraction(fraction) = config.contamination {
            let training_scores = samples
                .iter()
                .map(|s| forest.score_samples(s))
                .collect::<MLResult<Vec<f64>>>()?;

            forest.offset = percentile(&training_scores, 100.0 * fraction).ok_or(MLError::InsufficientData)?;
        }

        log::debug!(
            "Fitted isolation forest: {} trees, {} samples/tree, offset {:.5}",
            forest.trees.len(),
            max_samples,
            forest.offset
        );

        Ok(forest)
    }

    /// Calculate anomaly score for a sample
    pub fn anomaly_score(&self, sample: &Sample) -> MLResult<AnomalyScore> {
        if sample.num_features != self.num_features {
            return Err(MLError::DimensionMismatch {
                expected: self.num_features,
                actual: sample.num_features,
            });
        }
        if self.trees.is_empty() {
            return Err(MLError::InsufficientData);
        }

        let total_path_length = self
            .trees
            .iter()
            .map(|tree| tree.path_length(sample))
            .sum::<MLResult<f64>>()?;

        let avg_path_length = total_path_length / self.trees.len() as f64;
        let score = calculate_anomaly_score(avg_path_length, self.max_samples);

        Ok(AnomalyScore::new(score, avg_path_length, self.trees.len()))
    }

    /// Signed score, lower is more anomalous
    pub fn score_samples(&self, sample: &Sample) -> MLResult<f64> {
        Ok(self.anomaly_score(sample)?.signed())
    }

    /// `score_samples - offset`; negative marks an outlier
    pub fn decision_function(&self, sample: &Sample) -> MLResult<f64> {
        Ok(self.score_samples(sample)? - self.offset)
    }

    /// Check if a sample falls on the outlier side of the boundary
    pub fn is_anomaly(&self, sample: &Sample) -> MLResult<bool> {
        Ok(self.decision_function(sample)? < 0.0)
    }

    /// Outlier flags for many samples
    pub fn predict(&self, samples: &[Sample]) -> MLResult<Vec<bool>> {
        samples.iter().map(|s| self.is_anomaly(s)).collect()
    }

    /// Features per sample
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Decision boundary offset
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Get forest statistics
    pub fn stats(&self) -> ForestStats {
        ForestStats {
            num_trees: self.trees.len(),
            total_nodes: self.trees.iter().map(|t| t.node_count()).sum(),
            max_depth: self.trees.iter().map(|t| t.depth()).max().unwrap_or(0),
            max_samples: self.max_samples,
            offset: self.offset,
        }
    }
}

/// Forest statistics
#[derive(Debug, Clone, Copy)]
pub struct ForestStats {
    /// Number of trees
    pub num_trees: usize,
    /// Total nodes across all trees
    pub total_nodes: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Subsample size per tree
    pub max_samples: usize,
    /// Decision boundary offset
    pub offset: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_data() -> Vec<Sample> {
        let mut samples = Vec::new();

        // Normal data cluster
        for i in 0..60 {
            let temp = 20.0 + (i % 10) as f64 * 0.1;
            let humidity = 50.0 + (i / 10) as f64 * 0.2;
            samples.push(Sample::new(&[temp, humidity]).unwrap());
        }

        // Anomalies
        samples.push(Sample::new(&[35.0, 90.0]).unwrap());
        samples.push(Sample::new(&[5.0, 20.0]).unwrap());

        samples
    }

    fn small_config(contamination: Contamination) -> ForestConfig {
        ForestConfig {
            num_trees: 50,
            max_samples: 64,
            contamination,
            seed: 123,
        }
    }

    #[test]
    fn test_forest_fit() {
        let forest = IsolationForest::fit(&create_test_data(), &small_config(Contamination::Auto)).unwrap();

        let stats = forest.stats();
        assert_eq!(stats.num_trees, 50);
        assert_eq!(stats.max_samples, 62);
        assert!(stats.total_nodes > 50);
        // ceil(log2(62)) = 6
        assert!(stats.max_depth <= 6);
        assert_eq!(forest.offset(), -0.5);
    }

    #[test]
    fn test_anomaly_detection() {
        let forest =
            IsolationForest::fit(&create_test_data(), &small_config(Contamination::Fraction(0.05))).unwrap();

        let normal = Sample::new(&[20.4, 50.4]).unwrap();
        let anomaly = Sample::new(&[35.0, 90.0]).unwrap();

        let normal_decision = forest.decision_function(&normal).unwrap();
        let anomaly_decision = forest.decision_function(&anomaly).unwrap();

        assert!(anomaly_decision < normal_decision);
        assert!(forest.is_anomaly(&anomaly).unwrap());
        assert!(!forest.is_anomaly(&normal).unwrap());
    }

    #[test]
    fn contamination_sets_flag_rate() {
        let samples = create_test_data();
        let forest = IsolationForest::fit(&samples, &small_config(Contamination::Fraction(0.1))).unwrap();

        let flagged = forest.predict(&samples).unwrap().into_iter().filter(|&f| f).count();
        // 10% of 62 under the interpolated percentile, ties aside
        assert!(flagged <= 7);
        assert!(flagged >= 2);
    }

    #[test]
    fn same_seed_same_forest() {
        let samples = create_test_data();
        let config = small_config(Contamination::Fraction(0.05));
        let a = IsolationForest::fit(&samples, &config).unwrap();
        let b = IsolationForest::fit(&samples, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_input() {
        let samples = create_test_data();

        let config = small_config(Contamination::Fraction(0.7));
        assert!(matches!(IsolationForest::fit(&samples, &config), Err(MLError::InvalidConfig(_))));

        assert!(matches!(
            IsolationForest::fit(&[], &ForestConfig::default()),
            Err(MLError::InsufficientData)
        ));

        let poisoned = vec![Sample::new(&[1.0, f64::NAN]).unwrap(); 4];
        assert!(matches!(
            IsolationForest::fit(&poisoned, &ForestConfig::default()),
            Err(MLError::NonFiniteInput)
        ));
    }

    #[test]
    fn rejects_wrong_width() {
        let forest = IsolationForest::fit(&create_test_data(), &small_config(Contamination::Auto)).unwrap();
        let wide = Sample::new(&[1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            forest.decision_function(&wide),
            Err(MLError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }
}
