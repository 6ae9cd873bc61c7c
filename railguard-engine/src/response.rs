//! Wire response for one classified reading

use railguard_core::{Decision, Location, Severity};
use serde::{Deserialize, Serialize};

/// Classification result returned to the transport layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Node the reading came from
    pub node_id: String,
    /// Whether any rule flagged the reading
    pub is_anomaly: bool,
    /// Severity of the winning rule, LOW when quiet
    pub severity: Severity,
    /// Rounded to 2 decimals
    pub anomaly_score: f64,
    /// Human-readable explanations, empty when quiet
    pub reasons: Vec<String>,
    /// Node position as reported with the reading
    pub location: Location,
    /// Microphone level echoed from the reading
    pub mic_level: f64,
    /// Set only when the request fell back to the safe default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Build the response for a decision
    pub fn assemble(node_id: impl Into<String>, decision: Decision, location: Location, mic_level: f64) -> Self {
        Self {
            node_id: node_id.into(),
            is_anomaly: decision.is_anomaly,
            severity: decision.severity,
            anomaly_score: round2(decision.anomaly_score),
            reasons: decision.reasons,
            location,
            mic_level,
            error: None,
        }
    }

    /// Safe default carrying a diagnostic
    pub fn fallback(
        node_id: impl Into<String>,
        location: Location,
        mic_level: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::assemble(node_id, Decision::normal(), location, mic_level)
        }
    }
}

/// Round half away from zero to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HERE: Location = Location { lat: 12.97, lng: 77.59 };

    #[test]
    fn score_is_rounded() {
        let decision = Decision::anomaly(Severity::High, 0.484_937, "shake");
        let response = Response::assemble("N1", decision, HERE, 0.3);

        assert_eq!(response.anomaly_score, 0.48);
        assert_eq!(response.reasons, vec!["shake".to_string()]);
        assert_eq!(response.location, HERE);
        assert_eq!(response.mic_level, 0.3);
        assert!(response.error.is_none());
    }

    #[test]
    fn wire_format() {
        let response = Response::assemble("N1", Decision::anomaly(Severity::Medium, 0.2, "AI Pattern Anomaly"), HERE, 0.0);

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "node_id": "N1",
                "is_anomaly": true,
                "severity": "MEDIUM",
                "anomaly_score": 0.2,
                "reasons": ["AI Pattern Anomaly"],
                "location": { "lat": 12.97, "lng": 77.59 },
                "mic_level": 0.0
            })
        );
    }

    #[test]
    fn fallback_carries_error() {
        let response = Response::fallback("N2", Location::default(), 0.0, "Invalid reading");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["is_anomaly"], json!(false));
        assert_eq!(value["severity"], json!("LOW"));
        assert_eq!(value["anomaly_score"], json!(0.0));
        assert_eq!(value["reasons"], json!([]));
        assert_eq!(value["error"], json!("Invalid reading"));
    }

    #[test]
    fn rounding_edges() {
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(1.0), 1.0);
        assert_eq!(round2(0.456), 0.46);
        assert_eq!(round2(0.454), 0.45);
    }
}
