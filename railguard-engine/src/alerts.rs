//! Per-node alert rate limiting
//!
//! A node under attack produces a flagged response on nearly every reading.
//! Downstream notifiers only need the first one per cooldown period, so the
//! gate remembers when each node last raised an alert. Time is taken from the
//! readings themselves, keeping the gate deterministic under replay.

use std::collections::HashMap;

use parking_lot::Mutex;
use railguard_core::Timestamp;

use crate::Response;

/// Anti-spam gate in front of alert delivery
pub struct AlertCooldown {
    cooldown_ms: u64,
    last_alert: Mutex<HashMap<String, Timestamp>>,
}

impl AlertCooldown {
    /// Gate with no alert history
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            last_alert: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether a response should raise an alert
    ///
    /// Only anomalous responses qualify, and only if the node's previous alert
    /// is at least `cooldown_ms` older than `timestamp`. A reading stamped
    /// earlier than the last alert counts as inside the cooldown.
    pub fn should_alert(&self, timestamp: Timestamp, response: &Response) -> bool {
        if !response.is_anomaly {
            return false;
        }

        let mut last_alert = self.last_alert.lock();
        if let Some(&last) = last_alert.get(&response.node_id) {
            if timestamp.saturating_sub(last) < self.cooldown_ms {
                log::debug!("Alert suppressed for {} (cooldown active)", response.node_id);
                return false;
            }
        }

        last_alert.insert(response.node_id.clone(), timestamp);
        true
    }

    /// Minimum spacing between alerts of one node
    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_ms
    }
}
