//! RailGuard streaming tamper detection
//!
//! ## Overview
//!
//! Each trackside node streams telemetry (acceleration, magnetic field,
//! environment). For every reading the engine answers one question: is this
//! node being tampered with right now?
//!
//! ```text
//! SensorReading
//!      │
//!      ▼
//! FeatureBuilder ◀──▶ NodeBufferStore (40-sample window per node)
//!      │
//!      ▼
//! DecisionEngine: ThresholdRule ─▶ TiltRule ─▶ ModelScorer
//!      │
//!      ▼
//! Response (JSON) ─▶ AlertCooldown ─▶ notifier
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use railguard_core::{SensorReading, Severity};
//! use railguard_engine::{DecisionEngine, EngineConfig, Scoring};
//!
//! let engine = DecisionEngine::new(&EngineConfig::physics_only(), Scoring::PhysicsOnly).unwrap();
//!
//! let response = engine.process(&SensorReading::new("N-12", [12.0, 9.0, 13.0]));
//! assert!(response.is_anomaly);
//! assert_eq!(response.severity, Severity::High);
//! ```
//!
//! ## Failure Handling
//!
//! [`DecisionEngine::process`] never fails. Invalid numbers, model errors and
//! even a panicking model are answered with a non-anomalous LOW response that
//! carries an `error` message, so one bad frame cannot take the service down.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod alerts;
pub mod config;
pub mod engine;
pub mod error;
pub mod response;

pub use alerts::AlertCooldown;
pub use config::EngineConfig;
pub use engine::{DecisionEngine, EngineMode, Scoring};
pub use error::{EngineError, EngineResult};
pub use response::{round2, Response};
