//! Tamper decision engine
//!
//! ## Rule Precedence
//!
//! ```text
//! reading ─▶ FeatureBuilder ─▶ ThresholdRule ──hit──▶ HIGH
//!                                   │ miss
//!                                   ▼
//!                              TiltRule (if enabled, inert)
//!                                   │
//!                                   ▼
//!                     Scoring::Model? ──raw < cutoff──▶ MEDIUM
//!                                   │ otherwise
//!                                   ▼
//!                                  LOW
//! ```
//!
//! The first stage that produces a verdict wins; later stages never run. In
//! particular the model is never consulted for a reading the shake rule has
//! already flagged.
//!
//! Whether a model is available is decided once, at construction. A missing
//! or broken artifact puts the engine in physics-only mode for its whole
//! lifetime; nothing is retried or reloaded per request.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use railguard_core::constants::MODEL_REASON;
use railguard_core::{
    Decision, FeatureBuilder, FeatureVector, NodeBufferStore, SensorReading, Severity, ThresholdRule,
    TiltRule,
};
use railguard_ml::{ForestScorer, MLResult, ModelScorer};

use crate::{EngineConfig, EngineError, EngineResult, Response};

/// Scoring capability, fixed at startup
pub enum Scoring {
    /// Physics rules only
    PhysicsOnly,
    /// Physics rules backed by an outlier model
    Model(Box<dyn ModelScorer>),
}

impl Scoring {
    /// Load the forest and scaler artifacts
    pub fn from_artifacts(model_path: impl AsRef<Path>, scaler_path: impl AsRef<Path>) -> MLResult<Self> {
        let scorer = ForestScorer::load(model_path, scaler_path)?;
        Ok(Self::Model(Box::new(scorer)))
    }

    /// Which mode this capability puts the engine in
    /// Capability fixed at construction
    pub fn mode(&self) -> EngineMode {
        match self {
            Self::PhysicsOnly => EngineMode::PhysicsOnly,
            Self::Model(_) => EngineMode::Model,
        }
    }
}

impl fmt::Debug for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhysicsOnly => f.write_str("PhysicsOnly"),
            Self::Model(_) => f.write_str("Model(..)"),
        }
    }
}

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Shake rule only, no artifacts loaded
    PhysicsOnly,
    /// Shake rule backed by the outlier model
    Model,
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhysicsOnly => f.write_str("physics-only"),
            Self::Model => f.write_str("physics + model"),
        }
    }
}

/// Streaming tamper classifier
///
/// `Send + Sync`; share one instance across request handlers by reference or
/// `Arc`. Per-node history lives inside, so every reading must go through the
/// same engine for its node's rolling statistics to be meaningful.
pub struct DecisionEngine {
    features: FeatureBuilder,
    shake: ThresholdRule,
    tilt: Option<TiltRule>,
    scoring: Scoring,
    model_cutoff: f64,
}

impl DecisionEngine {
    /// Engine with an explicit scoring capability
    pub fn new(config: &EngineConfig, scoring: Scoring) -> EngineResult<Self> {
        config.validate()?;

        Ok(Self {
            features: FeatureBuilder::new(),
            shake: config.shake_rule()?,
            tilt: config.tilt_rule_enabled.then_some(TiltRule),
            scoring,
            model_cutoff: config.model_cutoff,
        })
    }

    /// Engine loading its model from the configured artifacts
    ///
    /// Artifact problems are not fatal: they are logged and the engine starts
    /// physics-only.
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let scoring = match (&config.model_path, &config.scaler_path) {
            (Some(model_path), Some(scaler_path)) => match Scoring::from_artifacts(model_path, scaler_path) {
                Ok(scoring) => {
                    log::info!(
                        "Loaded tamper model {} with scaler {}",
                        model_path.display(),
                        scaler_path.display()
                    );
                    scoring
                }
                Err(e) => {
                    log::warn!("Model artifacts unavailable ({}), continuing physics-only", e);
                    Scoring::PhysicsOnly
                }
            },
            _ => Scoring::PhysicsOnly,
        };

        let engine = Self::new(config, scoring)?;
        log::info!("Decision engine ready, mode: {}", engine.mode());
        Ok(engine)
    }

    /// Classify a reading
    ///
    /// Never fails: any error on the way is logged and answered with the safe
    /// default response carrying an `error` message.
    pub fn process(&self, reading: &SensorReading) -> Response {
        match self.decide(reading) {
            Ok(decision) => Response::assemble(&reading.node_id, decision, reading.location(), reading.mic_level),
            Err(e) => {
                log::warn!("Falling back to safe default for node {}: {}", reading.node_id, e);
                Response::fallback(&reading.node_id, reading.location(), reading.mic_level, e.to_string())
            }
        }
    }

    /// Classify a reading, surfacing failures
    ///
    /// Updates the node's rolling history unless the reading fails
    /// validation.
    pub fn decide(&self, reading: &SensorReading) -> EngineResult<Decision> {
        let features = self.features.build(reading)?;

        if let Some(hit) = self.shake.evaluate(features.accel_mag) {
            return Ok(hit.into());
        }

        if let Some(hit) = self.tilt.as_ref().and_then(|rule| rule.evaluate(reading)) {
            return Ok(hit.into());
        }

        match &self.scoring {
            Scoring::PhysicsOnly => Ok(Decision::normal()),
            Scoring::Model(scorer) => {
                let raw = score_guarded(scorer.as_ref(), &features)?;
                Ok(self.interpret(raw))
            }
        }
    }

    fn interpret(&self, raw: f64) -> Decision {
        if raw < self.model_cutoff {
            Decision::anomaly(Severity::Medium, raw.abs(), MODEL_REASON)
        } else {
            Decision::normal()
        }
    }

    pub fn mode(&self) -> EngineMode {
        self.scoring.mode()
    }

    /// Rolling history behind the engine
    pub fn store(&self) -> &NodeBufferStore {
        self.features.store()
    }

    /// Number of distinct nodes seen
    pub fn tracked_nodes(&self) -> usize {
        self.store().node_count()
    }
}

impl fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("shake", &self.shake)
            .field("tilt", &self.tilt)
            .field("scoring", &self.scoring)
            .field("model_cutoff", &self.model_cutoff)
            .field("tracked_nodes", &self.tracked_nodes())
            .finish()
    }
}

/// Run the scorer, turning a panic into an error
///
/// The scorer runs after the node's lock is released, so unwinding out of it
/// cannot leave a window half-updated.
fn score_guarded(scorer: &dyn ModelScorer, features: &FeatureVector) -> EngineResult<f64> {
    panic::catch_unwind(AssertUnwindSafe(|| scorer.score(features)))
        .map_err(|_| EngineError::ScorerPanicked)?
        .map_err(EngineError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use railguard_ml::MLError;

    struct Fixed(f64);

    impl ModelScorer for Fixed {
        fn score(&self, _features: &FeatureVector) -> MLResult<f64> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl ModelScorer for Broken {
        fn score(&self, _features: &FeatureVector) -> MLResult<f64> {
            Err(MLError::NonFiniteScore)
        }
    }

    fn engine(scoring: Scoring) -> DecisionEngine {
        DecisionEngine::new(&EngineConfig::physics_only(), scoring).unwrap()
    }

    fn resting(node: &str) -> SensorReading {
        SensorReading::new(node, [0.1, 0.2, 9.8])
    }

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DecisionEngine>();
    }

    #[test]
    fn model_cutoff_is_strict() {
        let at_cutoff = engine(Scoring::Model(Box::new(Fixed(-0.05))));
        assert_eq!(at_cutoff.decide(&resting("N1")).unwrap(), Decision::normal());

        let below = engine(Scoring::Model(Box::new(Fixed(-0.2))));
        let decision = below.decide(&resting("N1")).unwrap();
        assert!(decision.is_anomaly);
        assert_eq!(decision.severity, Severity::Medium);
        assert_eq!(decision.anomaly_score, 0.2);
        assert_eq!(decision.reasons, vec![MODEL_REASON.to_string()]);
    }

    #[test]
    fn model_error_surfaces_from_decide() {
        let engine = engine(Scoring::Model(Box::new(Broken)));
        assert!(matches!(
            engine.decide(&resting("N1")),
            Err(EngineError::Model(MLError::NonFiniteScore))
        ));
    }

    #[test]
    fn tilt_branch_never_decides() {
        let config = EngineConfig {
            tilt_rule_enabled: true,
            ..EngineConfig::physics_only()
        };
        let engine = DecisionEngine::new(&config, Scoring::PhysicsOnly).unwrap();

        let mut reading = resting("N1");
        reading.tilt = 0;
        reading.tilt_alert = true;
        assert_eq!(engine.decide(&reading).unwrap(), Decision::normal());
    }

    #[test]
    fn custom_threshold_applies() {
        let config = EngineConfig {
            shake_threshold: 10.0,
            ..EngineConfig::physics_only()
        };
        let engine = DecisionEngine::new(&config, Scoring::PhysicsOnly).unwrap();

        let decision = engine.decide(&SensorReading::new("N1", [0.0, 0.0, 12.0])).unwrap();
        assert_eq!(decision.severity, Severity::High);
        assert!((decision.anomaly_score - 0.2).abs() < 1e-12);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = EngineConfig {
            model_cutoff: f64::NAN,
            ..EngineConfig::physics_only()
        };
        assert!(DecisionEngine::new(&config, Scoring::PhysicsOnly).is_err());
    }

    #[test]
    fn mode_reflects_capability() {
        assert_eq!(engine(Scoring::PhysicsOnly).mode(), EngineMode::PhysicsOnly);
        assert_eq!(engine(Scoring::Model(Box::new(Fixed(0.1)))).mode(), EngineMode::Model);
        assert_eq!(EngineMode::PhysicsOnly.to_string(), "physics-only");
    }
}
