//! Classification outcome types

use alloc::string::String;
use alloc::vec::Vec;

/// Severity attached to a classified reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "UPPERCASE"))]
pub enum Severity {
    /// Normal reading
    #[default]
    Low,
    /// Flagged by the outlier model
    Medium,
    /// Physical threshold exceeded
    High,
    /// Reserved, no rule emits it yet
    Critical,
}

impl Severity {
    /// Wire name of the severity
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl core::fmt::Display for Severity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final verdict for one reading
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Decision {
    /// Whether the reading is considered tampering
    pub is_anomaly: bool,
    /// Severity level
    pub severity: Severity,
    /// Unrounded anomaly score
    pub anomaly_score: f64,
    /// Human-readable reasons, empty when normal
    pub reasons: Vec<String>,
}

impl Decision {
    /// Not anomalous, LOW, score 0
    pub fn normal() -> Self {
        Self::default()
    }

    /// Anomalous verdict with a single reason
    pub fn anomaly(severity: Severity, anomaly_score: f64, reason: impl Into<String>) -> Self {
        let mut reasons = Vec::with_capacity(1);
        reasons.push(reason.into());
        Self {
            is_anomaly: true,
            severity,
            anomaly_score,
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_is_safe_default() {
        let decision = Decision::normal();
        assert!(!decision.is_anomaly);
        assert_eq!(decision.severity, Severity::Low);
        assert_eq!(decision.anomaly_score, 0.0);
        assert!(decision.reasons.is_empty());
    }

    #[test]
    fn severity_ordering_and_names() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Critical > Severity::High);
        assert_eq!(Severity::Medium.as_str(), "MEDIUM");
    }

    #[cfg(feature = "std")]
    #[test]
    fn severity_wire_format() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"HIGH\"");
        let parsed: Severity = serde_json::from_str("\"CRITICAL\"").unwrap();
        assert_eq!(parsed, Severity::Critical);
    }
}
