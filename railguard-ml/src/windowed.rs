//! Exploratory windowed analysis of a raw accelerometer trace
//!
//! Cuts a trace into fixed, non-overlapping windows, summarizes each window
//! with six vibration features and scores the windows against each other
//! with their own isolation forest. Nothing here touches the streaming
//! engine; it is a tool for looking at recorded data.
//!
//! | # | Feature         | Definition over the window's magnitudes `m` |
//! |---|-----------------|---------------------------------------------|
//! | 0 | `rms`           | √(mean m²)                                  |
//! | 1 | `spectral_peak` | max \|DFT(m)\|                              |
//! | 2 | `variance`      | population variance of m                    |
//! | 3 | `tilt_change`   | \|mean z − mean x\|                         |
//! | 4 | `energy`        | Σ m²                                        |
//! | 5 | `std_dev`       | population std of m                         |

use std::f64::consts::PI;

use railguard_core::{magnitude, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{Contamination, ForestConfig, IsolationForest, MLError, MLResult, Sample};

/// Column names of [`WindowFeatures::to_array`]
pub const WINDOW_FEATURE_NAMES: [&str; 6] =
    ["rms", "spectral_peak", "variance", "tilt_change", "energy", "std_dev"];

/// One accelerometer sample of the trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSample {
    /// Capture time in milliseconds
    pub time: Timestamp,
    /// Acceleration along X
    pub x: f64,
    /// Acceleration along Y
    pub y: f64,
    /// Acceleration along Z
    pub z: f64,
}

/// Windowing and model settings
#[derive(Debug, Clone)]
pub struct WindowedConfig {
    /// Samples per window
    pub window: usize,
    /// Distance between window starts
    pub step: usize,
    /// Forest used to score the windows
    pub forest: ForestConfig,
}

impl Default for WindowedConfig {
    fn default() -> Self {
        Self {
            window: 200,
            step: 200,
            forest: ForestConfig::windowed(),
        }
    }
}

/// Vibration summary of one window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowFeatures {
    /// Root mean square of the magnitude
    pub rms: f64,
    /// Largest DFT magnitude
    pub spectral_peak: f64,
    /// Population variance of the magnitude
    pub variance: f64,
    /// `|mean(z) - mean(x)|`
    pub tilt_change: f64,
    /// Sum of squared magnitudes
    pub energy: f64,
    /// Square root of `variance`
    pub std_dev: f64,
}

impl WindowFeatures {
    /// Columns in [`WINDOW_FEATURE_NAMES`] order
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.rms,
            self.spectral_peak,
            self.variance,
            self.tilt_change,
            self.energy,
            self.std_dev,
        ]
    }
}

/// Scored window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    /// 1-based window number
    pub id: usize,
    /// Time of the window's first sample
    pub timestamp: Timestamp,
    /// Inputs the forest scored
    pub features: WindowFeatures,
    /// Forest decision value, negative for outlying windows
    pub anomaly_score: f64,
    /// `anomaly_score < 0`
    pub is_anomaly: bool,
}

/// Start offsets of the windows over a trace of `len` samples
///
/// A window only starts while `start < len - window`, so a trace whose
/// length is an exact multiple of the step drops its final full window.
pub fn segment(len: usize, window: usize, step: usize) -> MLResult<Vec<usize>> {
    if window == 0 || step == 0 {
        return Err(MLError::InvalidConfig("window and step must be positive"));
    }

    Ok((0..len.saturating_sub(window)).step_by(step).collect())
}

/// Summarize one window
pub fn extract_features(samples: &[AxisSample]) -> MLResult<WindowFeatures> {
    if samples.is_empty() {
        return Err(MLError::InsufficientData);
    }

    let n = samples.len() as f64;
    let mags: Vec<f64> = samples.iter().map(|s| magnitude([s.x, s.y, s.z])).collect();

    let energy: f64 = mags.iter().map(|m| m * m).sum();
    let mean = mags.iter().sum::<f64>() / n;
    let variance = mags.iter().map(|m| (m - mean) * (m - mean)).sum::<f64>() / n;
    let mean_x = samples.iter().map(|s| s.x).sum::<f64>() / n;
    let mean_z = samples.iter().map(|s| s.z).sum::<f64>() / n;

    let features = WindowFeatures {
        rms: (energy / n).sqrt(),
        spectral_peak: spectral_peak(&mags),
        variance,
        tilt_change: (mean_z - mean_x).abs(),
        energy,
        std_dev: variance.sqrt(),
    };

    if features.to_array().iter().all(|v| v.is_finite()) {
        Ok(features)
    } else {
        Err(MLError::NonFiniteInput)
    }
}

/// Largest DFT magnitude of a real signal
///
/// Bins above n/2 mirror the lower half for real input, so only
/// `0..=n/2` are evaluated.
fn spectral_peak(signal: &[f64]) -> f64 {
    let n = signal.len();
    (0..=n / 2)
        .map(|k| {
            let (re, im) = signal.iter().enumerate().fold((0.0, 0.0), |(re, im), (t, &x)| {
                let angle = -2.0 * PI * (k * t % n) as f64 / n as f64;
                (re + x * angle.cos(), im + x * angle.sin())
            });
            (re * re + im * im).sqrt()
        })
        .fold(0.0, f64::max)
}

/// Window, summarize and score a trace
pub fn analyze(trace: &[AxisSample], config: &WindowedConfig) -> MLResult<Vec<WindowReport>> {
    let starts = segment(trace.len(), config.window, config.step)?;
    if starts.is_empty() {
        return Err(MLError::InsufficientData);
    }

    let features = starts
        .iter()
        .map(|&start| extract_features(&trace[start..start + config.window]))
        .collect::<MLResult<Vec<_>>>()?;

    let samples = features
        .iter()
        .map(|f| Sample::new(&f.to_array()))
        .collect::<MLResult<Vec<_>>>()?;

    let forest = IsolationForest::fit(&samples, &config.forest)?;
    if let Contamination::Fraction(fraction) = config.forest.contamination {
        log::debug!("Scoring {} windows at contamination {}", samples.len(), fraction);
    }

    starts
        .iter()
        .zip(features)
        .zip(&samples)
        .enumerate()
        .map(|(i, ((&start, features), sample))| {
            let anomaly_score = forest.decision_function(sample)?;
            Ok(WindowReport {
                id: i + 1,
                timestamp: trace[start].time,
                features,
                anomaly_score,
                is_anomaly: anomaly_score < 0.0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still(time: Timestamp) -> AxisSample {
        AxisSample {
            time,
            x: 0.0,
            y: 0.0,
            z: 9.8,
        }
    }

    #[test]
    fn segment_skips_final_exact_window() {
        assert_eq!(segment(1000, 200, 200).unwrap(), vec![0, 200, 400, 600]);
        assert_eq!(segment(1001, 200, 200).unwrap(), vec![0, 200, 400, 600, 800]);
        assert!(segment(200, 200, 200).unwrap().is_empty());
        assert!(segment(100, 200, 200).unwrap().is_empty());
        assert!(segment(100, 0, 10).is_err());
    }

    #[test]
    fn features_of_constant_signal() {
        let window: Vec<AxisSample> = (0..8).map(still).collect();
        let f = extract_features(&window).unwrap();

        assert!((f.rms - 9.8).abs() < 1e-12);
        assert!(f.variance.abs() < 1e-12);
        assert!(f.std_dev.abs() < 1e-6);
        assert!((f.tilt_change - 9.8).abs() < 1e-12);
        assert!((f.energy - 8.0 * 9.8 * 9.8).abs() < 1e-9);
        // All energy in the DC bin
        assert!((f.spectral_peak - 8.0 * 9.8).abs() < 1e-9);
    }

    #[test]
    fn spectral_peak_finds_dominant_tone() {
        // Zero-mean tone at bin 4 of 32
        let signal: Vec<f64> = (0..32).map(|t| (2.0 * PI * 4.0 * t as f64 / 32.0).cos()).collect();
        assert!((spectral_peak(&signal) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn analyze_flags_shaken_window() {
        let mut trace: Vec<AxisSample> = (0..2001).map(still).collect();
        for (i, sample) in trace[1000..1200].iter_mut().enumerate() {
            let jolt = if i % 2 == 0 { 12.0 } else { -12.0 };
            sample.x = jolt;
            sample.z = 9.8 + jolt;
        }
        // Small jitter so the quiet windows are not identical
        for (i, sample) in trace.iter_mut().enumerate() {
            sample.y += (i % 7) as f64 * 0.01;
        }

        let config = WindowedConfig {
            forest: ForestConfig {
                contamination: Contamination::Fraction(0.1),
                ..ForestConfig::windowed()
            },
            ..WindowedConfig::default()
        };
        let reports = analyze(&trace, &config).unwrap();

        assert_eq!(reports.len(), 10);
        assert_eq!(reports[0].id, 1);
        assert_eq!(reports[5].timestamp, 1000);

        let shaken = &reports[5];
        assert!(shaken.is_anomaly);
        assert!(reports.iter().all(|r| r.anomaly_score >= shaken.anomaly_score));
    }

    #[test]
    fn short_trace_is_rejected() {
        let trace: Vec<AxisSample> = (0..150).map(still).collect();
        assert!(matches!(
            analyze(&trace, &WindowedConfig::default()),
            Err(MLError::InsufficientData)
        ));
    }
}
