//! Per-feature standardization
//!
//! `z = (x - mean) / scale`, where mean and scale are learned once from the
//! training split and applied unchanged at inference time. Scale is the
//! population standard deviation; a constant feature gets a scale of 1 so it
//! maps to 0 instead of dividing by zero.

use serde::{Deserialize, Serialize};

use crate::{MLError, MLResult, Sample};

/// Fitted standard scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Learn per-feature mean and scale
    pub fn fit(samples: &[Sample]) -> MLResult<Self> {
        let width = crate::common_width(samples)?;
        let n = samples.len() as f64;

        let mut mean = vec![0.0; width];
        for sample in samples {
            for (m, &x) in mean.iter_mut().zip(sample.as_slice()) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut scale = vec![0.0; width];
        for sample in samples {
            for ((s, &x), &m) in scale.iter_mut().zip(sample.as_slice()).zip(&mean) {
                *s += (x - m) * (x - m);
            }
        }
        for s in scale.iter_mut() {
            let std_dev = (*s / n).sqrt();
            *s = if std_dev > 0.0 { std_dev } else { 1.0 };
        }

        Self::from_parts(mean, scale)
    }

    /// Scaler from explicit statistics
    pub fn from_parts(mean: Vec<f64>, scale: Vec<f64>) -> MLResult<Self> {
        if mean.len() != scale.len() {
            return Err(MLError::DimensionMismatch {
                expected: mean.len(),
                actual: scale.len(),
            });
        }
        if mean.is_empty() {
            return Err(MLError::InsufficientData);
        }
        if mean.iter().chain(&scale).any(|v| !v.is_finite()) {
            return Err(MLError::NonFiniteInput);
        }
        if scale.iter().any(|&s| s == 0.0) {
            return Err(MLError::InvalidConfig("scale must be non-zero"));
        }

        Ok(Self { mean, scale })
    }

    /// Standardize one row given in model column order
    ///
    /// NaN would silently route down one side of every split, so non-finite
    /// input is an error.
    pub fn transform(&self, values: &[f64]) -> MLResult<Sample> {
        if values.len() != self.mean.len() {
            return Err(MLError::DimensionMismatch {
                expected: self.mean.len(),
                actual: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MLError::NonFiniteInput);
        }

        let scaled: Vec<f64> = values
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((&x, &m), &s)| (x - m) / s)
            .collect();

        Sample::new(&scaled)
    }

    /// Standardize many samples
    pub fn transform_all(&self, samples: &[Sample]) -> MLResult<Vec<Sample>> {
        samples.iter().map(|s| self.transform(s.as_slice())).collect()
    }

    /// Features per row
    pub fn num_features(&self) -> usize {
        self.mean.len()
    }

    /// Learned means
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Learned scales
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}
