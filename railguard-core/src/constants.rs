//! Tuning constants shared by the streaming path and the offline tooling
//!
//! The rolling window and threshold values are baked into the trained model's
//! input distribution. Changing them here without retraining shifts every
//! feature the scaler sees, so treat them as part of the artifact contract.

/// Rolling window length in samples (~1 second of data at ~40 Hz)
pub const WINDOW: usize = 40;

/// Acceleration magnitude above which a reading counts as a violent shake.
///
/// Resting nodes measure gravity alone (~9.8), so a stationary node never
/// crosses this line.
pub const SHAKE_THRESHOLD: f64 = 15.0;

/// Magnitude span over which the shake score ramps from 0 to 1
pub const SHAKE_SCORE_SPAN: f64 = 10.0;

/// Raw model decision value below which a reading is flagged
pub const MODEL_CUTOFF: f64 = -0.05;

/// Reason attached to model-flagged readings
pub const MODEL_REASON: &str = "AI Pattern Anomaly";

/// Minimum time between two alerts for the same node (milliseconds)
pub const ALERT_COOLDOWN_MS: u64 = 60 * 1000;
