//! Offline training of the streaming tamper model
//!
//! ```text
//! rows ─▶ stratified split ─▶ scaler.fit(train) ─▶ forest.fit(scaled train)
//!                  │                                        │
//!                  └──────── held-out rows ─────────▶ evaluate
//! ```
//!
//! The scaler only ever sees the training split, and the forest's
//! contamination is the labeled anomaly rate of that split.

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::{
    artifact, Contamination, ForestConfig, ForestScorer, IsolationForest, MLError, MLResult,
    Sample, StandardScaler, TrainingRow, DEFAULT_SAMPLE_SIZE,
};

/// Trainer settings
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Share of each class held out for evaluation
    pub test_fraction: f64,
    /// Trees in the forest
    pub num_trees: usize,
    /// Subsample size per tree
    pub max_samples: usize,
    /// Seed for both the split and the forest
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            num_trees: 300,
            max_samples: DEFAULT_SAMPLE_SIZE,
            seed: 42,
        }
    }
}

/// Binary confusion matrix, anomaly is the positive class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Normal rows predicted normal
    pub true_negatives: usize,
    /// Normal rows flagged
    pub false_positives: usize,
    /// Anomalies missed
    pub false_negatives: usize,
    /// Anomalies flagged
    pub true_positives: usize,
}

impl ConfusionMatrix {
    /// Tally predictions against labels
    pub fn from_predictions(labels: &[bool], predicted: &[bool]) -> Self {
        let mut matrix = Self::default();
        for (&actual, &flagged) in labels.iter().zip(predicted) {
            match (actual, flagged) {
                (false, false) => matrix.true_negatives += 1,
                (false, true) => matrix.false_positives += 1,
                (true, false) => matrix.false_negatives += 1,
                (true, true) => matrix.true_positives += 1,
            }
        }
        matrix
    }

    /// Rows tallied
    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    /// Share of correct predictions
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Share of flagged rows that are anomalies
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Share of anomalies that were flagged
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall, 0 when both are 0
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Held-out evaluation of a trained model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Test-split tallies
    pub confusion: ConfusionMatrix,
    /// See [`ConfusionMatrix::accuracy`]
    pub accuracy: f64,
    /// See [`ConfusionMatrix::precision`]
    pub precision: f64,
    /// See [`ConfusionMatrix::recall`]
    pub recall: f64,
    /// See [`ConfusionMatrix::f1`]
    pub f1: f64,
    /// Rows used to fit the model
    pub train_rows: usize,
    /// Labeled anomaly rate of the training split
    pub train_anomaly_rate: f64,
}

impl EvaluationReport {
    fn new(confusion: ConfusionMatrix, train_rows: usize, train_anomaly_rate: f64) -> Self {
        Self {
            confusion,
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            train_rows,
            train_anomaly_rate,
        }
    }
}

/// Scaler, forest and their held-out evaluation
#[derive(Debug, Clone)]
pub struct TrainedModel {
    /// Scaler fit on the training split
    pub scaler: StandardScaler,
    /// Forest fit on the scaled training split
    pub forest: IsolationForest,
    /// Test-split metrics
    pub report: EvaluationReport,
}

impl TrainedModel {
    /// Write both artifacts
    pub fn save(&self, model_path: impl AsRef<Path>, scaler_path: impl AsRef<Path>) -> MLResult<()> {
        artifact::save_model(model_path, &self.forest)?;
        artifact::save_scaler(scaler_path, &self.scaler)
    }

    /// Scorer for the streaming engine
    pub fn into_scorer(self) -> MLResult<ForestScorer> {
        ForestScorer::new(self.scaler, self.forest)
    }
}

/// Fit and evaluate the streaming model on labeled rows
pub fn train(rows: &[TrainingRow], config: &TrainConfig) -> MLResult<TrainedModel> {
    if !(0.0..1.0).contains(&config.test_fraction) {
        return Err(MLError::InvalidConfig("test_fraction must be in [0, 1)"));
    }

    let (train_idx, test_idx) = stratified_split(rows, config.test_fraction, config.seed);
    if train_idx.is_empty() {
        return Err(MLError::InsufficientData);
    }

    let to_samples = |idx: &[usize]| -> MLResult<Vec<Sample>> {
        idx.iter().map(|&i| Sample::new(&rows[i].features.to_array())).collect()
    };

    let train_samples = to_samples(&train_idx[..])?;
    let anomalies = train_idx.iter().filter(|&&i| rows[i].is_anomaly).count();
    let anomaly_rate = anomalies as f64 / train_idx.len() as f64;

    let contamination = if anomalies == 0 {
        Contamination::Auto
    } else if anomaly_rate > 0.5 {
        return Err(MLError::InvalidConfig("training anomaly rate above 0.5"));
    } else {
        Contamination::Fraction(anomaly_rate)
    };

    log::debug!(
        "Training on {} rows ({} held out), anomaly rate {:.4}",
        train_idx.len(),
        test_idx.len(),
        anomaly_rate
    );

    let scaler = StandardScaler::fit(&train_samples)?;
    let forest = IsolationForest::fit(
        &scaler.transform_all(&train_samples)?,
        &ForestConfig {
            num_trees: config.num_trees,
            max_samples: config.max_samples,
            contamination,
            seed: config.seed,
        },
    )?;

    let test_scaled = scaler.transform_all(&to_samples(&test_idx[..])?)?;
    let predicted = forest.predict(&test_scaled)?;
    let labels: Vec<bool> = test_idx.iter().map(|&i| rows[i].is_anomaly).collect();

    let report = EvaluationReport::new(
        ConfusionMatrix::from_predictions(&labels, &predicted),
        train_idx.len(),
        anomaly_rate,
    );

    log::info!(
        "Model trained: accuracy {:.4}, precision {:.4}, recall {:.4}, F1 {:.4}",
        report.accuracy,
        report.precision,
        report.recall,
        report.f1
    );

    Ok(TrainedModel { scaler, forest, report })
}

/// Split indices so each class keeps its proportion in both halves
///
/// The test split holds `ceil(n * test_fraction)` rows in total. Each class
/// gets the floor of its proportional share, and leftover slots go to the
/// classes with the largest fractional remainders.
fn stratified_split(rows: &[TrainingRow], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let classes: Vec<Vec<usize>> = [false, true]
        .iter()
        .map(|&label| (0..rows.len()).filter(|&i| rows[i].is_anomaly == label).collect())
        .collect();

    let n_test = (rows.len() as f64 * test_fraction).ceil() as usize;
    let quotas = allocate(&classes.iter().map(Vec::len).collect::<Vec<_>>(), n_test);

    let mut train = Vec::with_capacity(rows.len());
    let mut test = Vec::with_capacity(n_test);
    for (mut class, quota) in classes.into_iter().zip(quotas) {
        class.shuffle(&mut rng);
        test.extend_from_slice(&class[..quota]);
        train.extend_from_slice(&class[quota..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// Divide `total` draws across classes in proportion to their sizes
fn allocate(counts: &[usize], total: usize) -> Vec<usize> {
    let n: usize = counts.iter().sum();
    if n == 0 {
        return vec![0; counts.len()];
    }

    let shares: Vec<f64> = counts.iter().map(|&c| (total * c) as f64 / n as f64).collect();
    let mut quotas: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let rem = |i: usize| shares[i] - quotas[i] as f64;
        rem(b).total_cmp(&rem(a))
    });

    let mut left = total.saturating_sub(quotas.iter().sum());
    for i in order.into_iter().cycle().take(counts.len() * 2) {
        if left == 0 {
            break;
        }
        if quotas[i] < counts[i] {
            quotas[i] += 1;
            left -= 1;
        }
    }
    quotas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelScorer;
    use railguard_core::{FeatureVector, WindowStats};
    use rand::Rng;

    fn rows(normal: usize, tampered: usize) -> Vec<TrainingRow> {
        let mut rng = StdRng::seed_from_u64(5);
        let mut out = Vec::new();

        for i in 0..normal + tampered {
            let is_anomaly = i >= normal;
            let (accel, std, mag) = if is_anomaly {
                (rng.gen_range(13.0..18.0), rng.gen_range(2.0..4.0), rng.gen_range(150.0..300.0))
            } else {
                (rng.gen_range(9.6..10.0), rng.gen_range(0.0..0.2), rng.gen_range(45.0..50.0))
            };

            out.push(TrainingRow {
                latitude: 0.0,
                longitude: 0.0,
                features: FeatureVector {
                    accel_mag: accel,
                    delta_accel_mag: rng.gen_range(-0.1..0.1),
                    accel_std: std,
                    mag_norm: mag,
                    delta_mag_norm: rng.gen_range(-0.5..0.5),
                    temperature: rng.gen_range(22.0..24.0),
                    humidity: rng.gen_range(55.0..60.0),
                    pressure: rng.gen_range(101_250.0..101_350.0),
                },
                rolling: WindowStats::default(),
                is_anomaly,
            });
        }
        out
    }

    #[test]
    fn confusion_metrics() {
        let labels = [true, true, false, false, false];
        let predicted = [true, false, true, false, false];
        let m = ConfusionMatrix::from_predictions(&labels, &predicted);

        assert_eq!(m.true_positives, 1);
        assert_eq!(m.false_negatives, 1);
        assert_eq!(m.false_positives, 1);
        assert_eq!(m.true_negatives, 2);
        assert_eq!(m.accuracy(), 0.6);
        assert_eq!(m.precision(), 0.5);
        assert_eq!(m.recall(), 0.5);
        assert_eq!(m.f1(), 0.5);
    }

    #[test]
    fn undefined_metrics_are_zero() {
        let m = ConfusionMatrix::from_predictions(&[false, false], &[false, false]);
        assert_eq!(m.precision(), 0.0);
        assert_eq!(m.recall(), 0.0);
        assert_eq!(m.f1(), 0.0);
        assert_eq!(m.accuracy(), 1.0);
    }

    #[test]
    fn split_is_stratified() {
        let data = rows(90, 10);
        let (train, test) = stratified_split(&data, 0.2, 42);

        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        assert_eq!(test.iter().filter(|&&i| data[i].is_anomaly).count(), 2);
        assert_eq!(train.iter().filter(|&&i| data[i].is_anomaly).count(), 8);
    }

    #[test]
    fn split_size_rounds_up_over_all_rows() {
        // Per-class rounding would hold out 2 + 2 rows here
        let data = rows(6, 6);
        let (train, test) = stratified_split(&data, 0.25, 7);

        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 9);
        assert_eq!(test.iter().filter(|&&i| data[i].is_anomaly).count(), 1);

        // ceil(9 * 0.2) = 2, both from the majority class
        let data = rows(8, 1);
        let (_, test) = stratified_split(&data, 0.2, 7);
        assert_eq!(test.len(), 2);
        assert!(test.iter().all(|&i| !data[i].is_anomaly));
    }

    #[test]
    fn allocation_by_largest_remainder() {
        assert_eq!(allocate(&[7, 3], 3), vec![2, 1]);
        assert_eq!(allocate(&[6, 6], 3), vec![2, 1]);
        assert_eq!(allocate(&[5, 0], 2), vec![2, 0]);
        assert_eq!(allocate(&[0, 0], 0), vec![0, 0]);
    }

    #[test]
    fn trains_and_separates_tampering() {
        let data = rows(190, 10);
        let config = TrainConfig {
            num_trees: 100,
            ..TrainConfig::default()
        };
        let model = train(&data, &config).unwrap();

        assert_eq!(model.report.train_rows, 160);
        assert!((model.report.train_anomaly_rate - 0.05).abs() < 1e-12);
        assert_eq!(model.report.confusion.total(), 40);
        assert!(model.report.recall > 0.0);

        let scorer = model.into_scorer().unwrap();
        let tampered = data.last().unwrap().features;
        let quiet = data[0].features;
        assert!(scorer.score(&tampered).unwrap() < scorer.score(&quiet).unwrap());
    }

    #[test]
    fn rejects_majority_anomalies() {
        let data = rows(10, 30);
        assert!(matches!(
            train(&data, &TrainConfig::default()),
            Err(MLError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unlabeled_data_uses_auto_boundary() {
        let data = rows(50, 0);
        let config = TrainConfig {
            num_trees: 20,
            ..TrainConfig::default()
        };
        let model = train(&data, &config).unwrap();
        assert_eq!(model.forest.offset(), -0.5);
    }
}
