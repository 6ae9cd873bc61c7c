//! Engine configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "model_path": "/var/lib/railguard/isolation_forest.json", "tilt_rule_enabled": true }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use railguard_core::constants::{ALERT_COOLDOWN_MS, MODEL_CUTOFF, SHAKE_SCORE_SPAN, SHAKE_THRESHOLD};
use railguard_core::ThresholdRule;
use railguard_ml::artifact::{MODEL_FILE, SCALER_FILE};
use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineResult};

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Forest artifact, `None` to skip the model entirely
    pub model_path: Option<PathBuf>,
    /// Scaler artifact, `None` to skip the model entirely
    pub scaler_path: Option<PathBuf>,
    /// Magnitude that must be strictly exceeded for a violent shake
    pub shake_threshold: f64,
    /// Magnitude span over which the shake score ramps to 1
    pub shake_score_span: f64,
    /// Raw model value below which a reading is flagged
    pub model_cutoff: f64,
    /// Route readings through the tilt rule
    pub tilt_rule_enabled: bool,
    /// Minimum spacing between alerts for one node
    pub alert_cooldown_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: Some(PathBuf::from(MODEL_FILE)),
            scaler_path: Some(PathBuf::from(SCALER_FILE)),
            shake_threshold: SHAKE_THRESHOLD,
            shake_score_span: SHAKE_SCORE_SPAN,
            model_cutoff: MODEL_CUTOFF,
            tilt_rule_enabled: false,
            alert_cooldown_ms: ALERT_COOLDOWN_MS,
        }
    }
}

impl EngineConfig {
    /// Defaults without any model artifacts
    pub fn physics_only() -> Self {
        Self {
            model_path: None,
            scaler_path: None,
            ..Self::default()
        }
    }

    /// Default artifact names resolved against a directory
    pub fn with_artifact_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model_path: Some(dir.join(MODEL_FILE)),
            scaler_path: Some(dir.join(SCALER_FILE)),
            ..Self::default()
        }
    }

    /// Parse from JSON
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Shake rule described by this config
    pub fn shake_rule(&self) -> EngineResult<ThresholdRule> {
        Ok(ThresholdRule::new(self.shake_threshold, self.shake_score_span)?)
    }

    /// Check value ranges
    pub fn validate(&self) -> EngineResult<()> {
        self.shake_rule()?;
        if !self.model_cutoff.is_finite() {
            return Err(EngineError::Config("model_cutoff must be finite".into()));
        }
        Ok(())
    }
}
