//! Deterministic physics rules
//!
//! Rules run before any learned model and take precedence over it. Each rule
//! is a pure function of its input: it either produces a [`RuleHit`] that
//! finalizes the decision, or `None` to let the next stage look at the
//! reading.
//!
//! | Rule            | Input       | Fires when                  | Severity |
//! |-----------------|-------------|-----------------------------|----------|
//! | `ThresholdRule` | `accel_mag` | `accel_mag > 15.0` (strict) | HIGH     |
//! | `TiltRule`      | reading     | never (inert placeholder)   | -        |

use alloc::format;
use alloc::string::String;

use crate::{
    constants::{SHAKE_SCORE_SPAN, SHAKE_THRESHOLD},
    decision::{Decision, Severity},
    errors::{ValidationError, ValidationResult},
    reading::{SensorReading, Validatable},
};

/// A rule that fired
#[derive(Debug, Clone, PartialEq)]
pub struct RuleHit {
    /// Severity assigned by the rule
    pub severity: Severity,
    /// Score in [0, 1]
    pub score: f64,
    /// Human-readable explanation
    pub reason: String,
}

impl From<RuleHit> for Decision {
    fn from(hit: RuleHit) -> Self {
        Decision::anomaly(hit.severity, hit.score, hit.reason)
    }
}

/// Violent-shake detector on the instantaneous acceleration magnitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRule {
    /// Magnitude that must be strictly exceeded
    threshold: f64,

    /// Magnitude above the threshold at which the score saturates at 1.0
    score_span: f64,
}

impl Default for ThresholdRule {
    fn default() -> Self {
        Self {
            threshold: SHAKE_THRESHOLD,
            score_span: SHAKE_SCORE_SPAN,
        }
    }
}

impl ThresholdRule {
    /// Create a rule with a custom threshold and score span
    ///
    /// The span must be finite and strictly positive.
    pub fn new(threshold: f64, score_span: f64) -> ValidationResult<Self> {
        if !threshold.is_valid() {
            return Err(ValidationError::NonFinite { field: "shake_threshold" });
        }
        if !score_span.is_valid() || score_span <= 0.0 {
            return Err(ValidationError::OutOfRange {
                value: score_span,
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
            });
        }

        Ok(Self { threshold, score_span })
    }

    /// Magnitude that must be exceeded
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Evaluate the rule against an acceleration magnitude
    ///
    /// Score is `(accel_mag - threshold) / span` clamped to [0, 1].
    pub fn evaluate(&self, accel_mag: f64) -> Option<RuleHit> {
        if accel_mag <= self.threshold {
            return None;
        }

        let score = ((accel_mag - self.threshold) / self.score_span).clamp(0.0, 1.0);

        Some(RuleHit {
            severity: Severity::High,
            score,
            reason: format!("Violent shake detected (accel_mag={:.2})", accel_mag),
        })
    }
}

/// Tilt-switch rule
///
/// Inert: `tilt` and `tilt_alert` are accepted on every reading but no verdict
/// is derived from them. Kept as a distinct stage so enabling it is a
/// configuration change, not a pipeline change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiltRule;

impl TiltRule {
    /// Always `None`
    pub fn evaluate(&self, _reading: &SensorReading) -> Option<RuleHit> {
        None
    }
}
