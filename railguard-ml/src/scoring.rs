//! Anomaly score calculation
//!
//! Path-length normalization and the percentile used to place the decision
//! boundary. The formulas follow the original Isolation Forest paper and the
//! conventions of the scikit-learn implementation the deployed artifacts were
//! validated against.

use crate::EULER_GAMMA;

/// Anomaly score result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyScore {
    /// Normalized score in (0, 1], higher is more anomalous
    pub score: f64,
    /// Average path length across trees
    pub avg_path_length: f64,
    /// Number of trees used
    pub num_trees: usize,
}

impl AnomalyScore {
    /// Create a new anomaly score
    pub fn new(score: f64, avg_path_length: f64, num_trees: usize) -> Self {
        Self {
            score,
            avg_path_length,
            num_trees,
        }
    }

    /// Signed score, lower is more anomalous (`score_samples` convention)
    pub fn signed(&self) -> f64 {
        -self.score
    }
}

/// Average path length of an unsuccessful BST search over `n` points
///
/// `c(n) = 2 H(n-1) - 2 (n-1) / n` with `H(i) ≈ ln(i) + γ`, and the exact
/// values `c(0) = c(1) = 0`, `c(2) = 1`.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Calculate anomaly score from path lengths
///
/// Uses the formula: score = 2^(-E(h(x))/c(n))
/// where E(h(x)) is expected path length and c(n) is average path length
pub fn calculate_anomaly_score(avg_path_length: f64, num_samples: usize) -> f64 {
    let expected_path = average_path_length(num_samples);
    if expected_path == 0.0 {
        return 0.5; // Neutral score
    }

    2.0_f64.powf(-avg_path_length / expected_path)
}

/// Percentile with linear interpolation between closest ranks
///
/// `q` is in percent. Returns `None` for an empty input or a `q` outside
/// [0, 100].
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&q) {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
