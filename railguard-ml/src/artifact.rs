//! On-disk model and scaler artifacts
//!
//! Both artifacts are JSON documents wrapped in a small envelope:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "feature_names": ["accel_mag", "delta_accel_mag", "..."],
//!   "body": { "...": "model or scaler fields" }
//! }
//! ```
//!
//! The feature names travel with the artifact so a scaler fit on one column
//! order can never be silently applied to another. Loading checks the
//! envelope against the column order the streaming path produces.

use std::fs;
use std::path::Path;

use railguard_core::FEATURE_NAMES;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{IsolationForest, MLError, MLResult, StandardScaler};

/// Current envelope version
pub const FORMAT_VERSION: u32 = 1;

/// Default model artifact file name
pub const MODEL_FILE: &str = "isolation_forest.json";

/// Default scaler artifact file name
pub const SCALER_FILE: &str = "scaler.json";

/// Versioned artifact envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactFile<T> {
    /// Envelope version
    pub format_version: u32,
    /// Input columns, in order
    pub feature_names: Vec<String>,
    /// Model or scaler payload
    pub body: T,
}

impl<T: Serialize + DeserializeOwned> ArtifactFile<T> {
    /// Wrap a payload for the given column order
    pub fn new(feature_names: &[&str], body: T) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            feature_names: feature_names.iter().map(|name| name.to_string()).collect(),
            body,
        }
    }

    /// Write the envelope as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> MLResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read an envelope and check it against the expected columns
    pub fn load(path: impl AsRef<Path>, expected_features: &[&str]) -> MLResult<Self> {
        let json = fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&json)?;

        if artifact.format_version != FORMAT_VERSION {
            return Err(MLError::IncompatibleArtifact(format!(
                "format version {} (expected {})",
                artifact.format_version, FORMAT_VERSION
            )));
        }
        if artifact.feature_names != expected_features {
            return Err(MLError::IncompatibleArtifact(format!(
                "feature columns {:?} (expected {:?})",
                artifact.feature_names, expected_features
            )));
        }

        Ok(artifact)
    }
}

/// Persist a streaming model
pub fn save_model(path: impl AsRef<Path>, forest: &IsolationForest) -> MLResult<()> {
    ArtifactFile::new(&FEATURE_NAMES, forest.clone()).save(path)
}

/// Load a streaming model
pub fn load_model(path: impl AsRef<Path>) -> MLResult<IsolationForest> {
    let forest = ArtifactFile::<IsolationForest>::load(path, &FEATURE_NAMES)?.body;
    if forest.num_features() != FEATURE_NAMES.len() {
        return Err(MLError::DimensionMismatch {
            expected: FEATURE_NAMES.len(),
            actual: forest.num_features(),
        });
    }
    Ok(forest)
}

/// Persist a streaming scaler
pub fn save_scaler(path: impl AsRef<Path>, scaler: &StandardScaler) -> MLResult<()> {
    ArtifactFile::new(&FEATURE_NAMES, scaler.clone()).save(path)
}

/// Load a streaming scaler
pub fn load_scaler(path: impl AsRef<Path>) -> MLResult<StandardScaler> {
    let raw = ArtifactFile::<StandardScaler>::load(path, &FEATURE_NAMES)?.body;

    // Re-run the constructor checks on whatever came off disk
    let scaler = StandardScaler::from_parts(raw.mean().to_vec(), raw.scale().to_vec())?;
    if scaler.num_features() != FEATURE_NAMES.len() {
        return Err(MLError::DimensionMismatch {
            expected: FEATURE_NAMES.len(),
            actual: scaler.num_features(),
        });
    }
    Ok(scaler)
}
