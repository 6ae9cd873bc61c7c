//! Core streaming primitives for RailGuard
//!
//! Turns raw node telemetry into the inputs of the tamper decision:
//! per-node rolling vibration history, the fixed-schema feature vector and
//! the deterministic physics rules that run ahead of any learned model.
//!
//! Key constraints:
//! - Bounded memory per node (fixed 40-sample window)
//! - Same-node requests serialize, different nodes never contend
//! - Numeric semantics identical to the offline feature preparation
//!
//! ```no_run
//! use railguard_core::{FeatureBuilder, SensorReading, ThresholdRule};
//!
//! let builder = FeatureBuilder::new();
//! let rule = ThresholdRule::default();
//!
//! let reading = SensorReading::new("N-17", [0.2, 0.1, 9.8]);
//! let features = builder.build(&reading).expect("finite reading");
//!
//! match rule.evaluate(features.accel_mag) {
//!     Some(hit) => println!("{}: {}", hit.severity, hit.reason),
//!     None => {} // hand over to the model stage
//! }
//! ```

#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod buffer;
pub mod constants;
pub mod decision;
pub mod errors;
pub mod features;
pub mod reading;
pub mod rules;
#[cfg(feature = "std")]
pub mod store;

// Public API
pub use buffer::{RollingWindow, WindowStats};
pub use constants::WINDOW;
pub use decision::{Decision, Severity};
pub use errors::{ValidationError, ValidationResult};
pub use features::{magnitude, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use reading::{Location, SensorReading, Timestamp, Validatable};
pub use rules::{RuleHit, ThresholdRule, TiltRule};

#[cfg(feature = "std")]
pub use features::FeatureBuilder;
#[cfg(feature = "std")]
pub use store::NodeBufferStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
