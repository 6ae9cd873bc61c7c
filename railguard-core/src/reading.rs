//! Sensor reading as delivered by a trackside node
//!
//! One reading is one request. The transport collaborator has already checked
//! that every required field is present and numeric; what remains for the core
//! is making sure those numbers are finite before they reach the rolling
//! history.

use alloc::string::String;

use crate::errors::{ValidationError, ValidationResult};

/// Milliseconds since the Unix epoch, as stamped by the node
pub type Timestamp = u64;

/// Single telemetry sample from a node
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorReading {
    /// Node identifier, used as the rolling-history key
    pub node_id: String,
    /// Device timestamp in milliseconds
    pub timestamp: Timestamp,

    /// Acceleration, X axis (m/s²)
    pub accel_x: f64,
    /// Acceleration, Y axis (m/s²)
    pub accel_y: f64,
    /// Acceleration, Z axis (m/s²)
    pub accel_z: f64,

    /// Magnetic field, X axis (µT)
    pub mag_x: f64,
    /// Magnetic field, Y axis (µT)
    pub mag_y: f64,
    /// Magnetic field, Z axis (µT)
    pub mag_z: f64,

    /// Compass heading in degrees
    pub heading: f64,
    /// Raw tilt switch state
    pub tilt: i64,
    /// Tilt alert flag raised by the node firmware
    pub tilt_alert: bool,

    /// Ambient temperature (°C)
    pub temperature: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Barometric pressure (Pa)
    pub pressure: f64,

    /// GPS latitude, 0.0 when the node has no fix
    #[cfg_attr(feature = "std", serde(default))]
    pub latitude: f64,
    /// GPS longitude, 0.0 when the node has no fix
    #[cfg_attr(feature = "std", serde(default))]
    pub longitude: f64,
    /// Microphone level, 0.0 on nodes without a microphone
    #[cfg_attr(feature = "std", serde(default))]
    pub mic_level: f64,
}

impl SensorReading {
    /// Reading with the given id and acceleration, all other fields zeroed
    pub fn new(node_id: impl Into<String>, accel: [f64; 3]) -> Self {
        Self {
            node_id: node_id.into(),
            timestamp: 0,
            accel_x: accel[0],
            accel_y: accel[1],
            accel_z: accel[2],
            mag_x: 0.0,
            mag_y: 0.0,
            mag_z: 0.0,
            heading: 0.0,
            tilt: 1,
            tilt_alert: false,
            temperature: 0.0,
            humidity: 0.0,
            pressure: 0.0,
            latitude: 0.0,
            longitude: 0.0,
            mic_level: 0.0,
        }
    }

    /// Acceleration vector
    pub fn accel(&self) -> [f64; 3] {
        [self.accel_x, self.accel_y, self.accel_z]
    }

    /// Magnetic field vector
    pub fn mag(&self) -> [f64; 3] {
        [self.mag_x, self.mag_y, self.mag_z]
    }

    /// Location echoed back in the response
    pub fn location(&self) -> Location {
        Location {
            lat: self.latitude,
            lng: self.longitude,
        }
    }

    /// Check that every numeric field is finite
    ///
    /// Reports the first offending field in declaration order.
    pub fn check_finite(&self) -> ValidationResult<()> {
        let fields = [
            ("accel_x", self.accel_x),
            ("accel_y", self.accel_y),
            ("accel_z", self.accel_z),
            ("mag_x", self.mag_x),
            ("mag_y", self.mag_y),
            ("mag_z", self.mag_z),
            ("heading", self.heading),
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("pressure", self.pressure),
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("mic_level", self.mic_level),
        ];

        match fields.iter().find(|(_, value)| !value.is_valid()) {
            Some(&(field, _)) => Err(ValidationError::NonFinite { field }),
            None => Ok(()),
        }
    }
}

/// Latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

/// Trait for values that can be validated
pub trait Validatable {
    /// Check if the value is usable in arithmetic (not NaN, not infinite)
    fn is_valid(&self) -> bool;
}

impl Validatable for f32 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

impl Validatable for f64 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}
