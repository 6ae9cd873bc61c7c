//! Fixed-schema feature vector for the outlier model
//!
//! ## Column Order
//!
//! The scaler and the forest were fit on columns in exactly this order, so
//! [`FeatureVector::to_array`] is the only sanctioned way to hand features to
//! a model:
//!
//! | # | Column            | Streaming source                         |
//! |---|-------------------|------------------------------------------|
//! | 0 | `accel_mag`       | √(ax² + ay² + az²)                       |
//! | 1 | `delta_accel_mag` | always 0                                 |
//! | 2 | `accel_std`       | population std of the node's window      |
//! | 3 | `mag_norm`        | √(mx² + my² + mz²)                       |
//! | 4 | `delta_mag_norm`  | always 0                                 |
//! | 5 | `temperature`     | copied                                   |
//! | 6 | `humidity`        | copied                                   |
//! | 7 | `pressure`        | copied                                   |
//!
//! The streaming path does not track the previous reading per node, so both
//! delta columns stay at 0. The deployed model was trained against that
//! convention; do not fill them in without retraining.

use crate::reading::SensorReading;

#[cfg(feature = "std")]
use crate::{
    errors::{ValidationError, ValidationResult},
    store::NodeBufferStore,
};

/// Number of model input columns
pub const FEATURE_COUNT: usize = 8;

/// Column names in model order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "accel_mag",
    "delta_accel_mag",
    "accel_std",
    "mag_norm",
    "delta_mag_norm",
    "temperature",
    "humidity",
    "pressure",
];

/// Euclidean norm of a 3-axis vector
pub fn magnitude(v: [f64; 3]) -> f64 {
    libm::sqrt(v[0] * v[0] + v[1] * v[1] + v[2] * v[2])
}

/// Model input derived from one reading plus its node's history
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureVector {
    /// Instantaneous acceleration magnitude
    pub accel_mag: f64,
    /// Change in acceleration magnitude since the previous reading
    pub delta_accel_mag: f64,
    /// Rolling standard deviation of the acceleration magnitude
    pub accel_std: f64,
    /// Magnetic field strength
    pub mag_norm: f64,
    /// Change in field strength since the previous reading
    pub delta_mag_norm: f64,
    /// Ambient temperature
    pub temperature: f64,
    /// Relative humidity
    pub humidity: f64,
    /// Barometric pressure
    pub pressure: f64,
}

impl FeatureVector {
    /// Columns in model order
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.accel_mag,
            self.delta_accel_mag,
            self.accel_std,
            self.mag_norm,
            self.delta_mag_norm,
            self.temperature,
            self.humidity,
            self.pressure,
        ]
    }

    /// Rebuild a vector from columns in model order
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            accel_mag: values[0],
            delta_accel_mag: values[1],
            accel_std: values[2],
            mag_norm: values[3],
            delta_mag_norm: values[4],
            temperature: values[5],
            humidity: values[6],
            pressure: values[7],
        }
    }

    /// Streaming features for a reading given its window std
    pub fn streaming(reading: &SensorReading, accel_std: f64) -> Self {
        Self {
            accel_mag: magnitude(reading.accel()),
            delta_accel_mag: 0.0,
            accel_std,
            mag_norm: magnitude(reading.mag()),
            delta_mag_norm: 0.0,
            temperature: reading.temperature,
            humidity: reading.humidity,
            pressure: reading.pressure,
        }
    }
}

/// Turns readings into feature vectors, updating per-node history
#[cfg(feature = "std")]
#[derive(Default)]
pub struct FeatureBuilder {
    store: NodeBufferStore,
}

#[cfg(feature = "std")]
impl FeatureBuilder {
    /// Builder over an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder over an existing store
    pub fn with_store(store: NodeBufferStore) -> Self {
        Self { store }
    }

    /// The rolling history backing this builder
    pub fn store(&self) -> &NodeBufferStore {
        &self.store
    }

    /// Derive the feature vector for a reading
    ///
    /// Rejects non-finite input before the node's window is touched, so a bad
    /// reading never pollutes later rolling statistics. Finite axes whose norm
    /// overflows count as non-finite too.
    pub fn build(&self, reading: &SensorReading) -> ValidationResult<FeatureVector> {
        reading.check_finite()?;

        let accel_mag = magnitude(reading.accel());
        if !accel_mag.is_finite() {
            return Err(ValidationError::NonFinite { field: "accel_mag" });
        }
        if !magnitude(reading.mag()).is_finite() {
            return Err(ValidationError::NonFinite { field: "mag_norm" });
        }

        let accel_std = self.store.append(&reading.node_id, accel_mag);

        Ok(FeatureVector::streaming(reading, accel_std))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_of_known_vectors() {
        assert_eq!(magnitude([3.0, 4.0, 0.0]), 5.0);
        assert_eq!(magnitude([0.0, 0.0, 0.0]), 0.0);
        assert!((magnitude([12.0, 9.0, 13.0]) - 19.6469).abs() < 1e-4);
    }

    #[test]
    fn array_order_matches_names() {
        let features = FeatureVector::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(features.accel_std, 3.0);
        assert_eq!(features.pressure, 8.0);
        assert_eq!(features.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(FEATURE_NAMES[2], "accel_std");
    }

    #[cfg(feature = "std")]
    mod builder {
        use super::super::*;
        use crate::errors::ValidationError;

        fn reading(node: &str, accel: [f64; 3]) -> SensorReading {
            let mut reading = SensorReading::new(node, accel);
            reading.mag_x = 30.0;
            reading.mag_y = 0.0;
            reading.mag_z = 40.0;
            reading.temperature = 21.5;
            reading.humidity = 55.0;
            reading.pressure = 101_325.0;
            reading
        }

        #[test]
        fn builds_streaming_features() {
            let builder = FeatureBuilder::new();
            let features = builder.build(&reading("A", [0.0, 6.0, 8.0])).unwrap();

            assert_eq!(features.accel_mag, 10.0);
            assert_eq!(features.mag_norm, 50.0);
            assert_eq!(features.accel_std, 0.0);
            assert_eq!(features.delta_accel_mag, 0.0);
            assert_eq!(features.delta_mag_norm, 0.0);
            assert_eq!(features.temperature, 21.5);
            assert_eq!(features.humidity, 55.0);
            assert_eq!(features.pressure, 101_325.0);
        }

        #[test]
        fn std_follows_node_history() {
            let builder = FeatureBuilder::new();
            builder.build(&reading("A", [0.0, 0.0, 8.0])).unwrap();
            let features = builder.build(&reading("A", [0.0, 0.0, 12.0])).unwrap();

            // [8, 12] has population std 2
            assert!((features.accel_std - 2.0).abs() < 1e-12);
            // delta stays zero even though the magnitude moved
            assert_eq!(features.delta_accel_mag, 0.0);
        }

        #[test]
        fn non_finite_input_leaves_history_untouched() {
            let builder = FeatureBuilder::new();
            builder.build(&reading("A", [0.0, 0.0, 9.8])).unwrap();

            let mut bad = reading("A", [0.0, 0.0, 9.8]);
            bad.humidity = f64::NAN;

            assert_eq!(
                builder.build(&bad),
                Err(ValidationError::NonFinite { field: "humidity" })
            );
            assert_eq!(builder.store().len("A"), 1);
        }

        #[test]
        fn overflowing_norms_are_rejected() {
            let builder = FeatureBuilder::new();
            builder.build(&reading("A", [0.0, 0.0, 9.8])).unwrap();

            assert_eq!(
                builder.build(&reading("A", [1e200, 0.0, 0.0])),
                Err(ValidationError::NonFinite { field: "accel_mag" })
            );

            let mut magnet = reading("A", [0.0, 0.0, 9.8]);
            magnet.mag_y = -3e155;
            assert_eq!(
                builder.build(&magnet),
                Err(ValidationError::NonFinite { field: "mag_norm" })
            );

            assert_eq!(builder.store().snapshot("A").unwrap(), vec![9.8]);
            let next = builder.build(&reading("A", [0.0, 0.0, 9.8])).unwrap();
            assert_eq!(next.accel_std, 0.0);
        }
    }
}
