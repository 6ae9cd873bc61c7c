//! Batch feature preparation for training
//!
//! Turns a recorded telemetry log into labeled feature rows. Unlike the
//! streaming path, the batch pass sees the whole log, so it fills in the
//! row-to-row deltas and uses the sample standard deviation (divisor `n - 1`)
//! over the rolling window.

use railguard_core::{magnitude, FeatureVector, RollingWindow, WindowStats, WINDOW};
use serde::{Deserialize, Serialize};

/// One row of the raw capture log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct RawRecord {
    /// Acceleration along X (m/s²)
    pub accel_x: f64,
    /// Acceleration along Y (m/s²)
    pub accel_y: f64,
    /// Acceleration along Z (m/s²)
    pub accel_z: f64,
    /// Magnetic field along X (µT)
    pub mag_x: f64,
    /// Magnetic field along Y (µT)
    pub mag_y: f64,
    /// Magnetic field along Z (µT)
    pub mag_z: f64,
    /// Ambient temperature (°C)
    pub temperature: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Barometric pressure (Pa)
    pub pressure: f64,
    /// Node latitude, 0 when not logged
    #[serde(default)]
    pub latitude: f64,
    /// Node longitude, 0 when not logged
    #[serde(default)]
    pub longitude: f64,
    /// Ground-truth tamper label
    #[serde(rename = "is_anomaly", default)]
    pub is_anomaly: bool,
}

/// Labeled model input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    /// Copied from the raw record
    pub latitude: f64,
    /// Copied from the raw record
    pub longitude: f64,
    /// Model columns
    pub features: FeatureVector,
    /// Rolling summary of the acceleration magnitude, `std_dev` is the sample std
    pub rolling: WindowStats,
    /// Ground-truth tamper label
    pub is_anomaly: bool,
}

/// Derive training rows from a capture log, in log order
pub fn prepare_features(records: &[RawRecord]) -> Vec<TrainingRow> {
    let mut window = RollingWindow::<WINDOW>::new();
    let mut previous: Option<(f64, f64)> = None;

    records
        .iter()
        .map(|record| {
            let accel_mag = magnitude([record.accel_x, record.accel_y, record.accel_z]);
            let mag_norm = magnitude([record.mag_x, record.mag_y, record.mag_z]);

            let (delta_accel_mag, delta_mag_norm) = match previous {
                Some((prev_accel, prev_mag)) => (accel_mag - prev_accel, mag_norm - prev_mag),
                None => (0.0, 0.0),
            };
            previous = Some((accel_mag, mag_norm));

            window.push(accel_mag);
            let mut rolling = window.stats();
            rolling.std_dev = sample_std(&rolling);

            TrainingRow {
                latitude: record.latitude,
                longitude: record.longitude,
                features: FeatureVector {
                    accel_mag,
                    delta_accel_mag,
                    accel_std: rolling.std_dev,
                    mag_norm,
                    delta_mag_norm,
                    temperature: record.temperature,
                    humidity: record.humidity,
                    pressure: record.pressure,
                },
                rolling,
                is_anomaly: record.is_anomaly,
            }
        })
        .collect()
}

/// Rescale a population std to the sample std, 0 for a single sample
fn sample_std(stats: &WindowStats) -> f64 {
    if stats.count < 2 {
        return 0.0;
    }
    let n = stats.count as f64;
    stats.std_dev * (n / (n - 1.0)).sqrt()
}
