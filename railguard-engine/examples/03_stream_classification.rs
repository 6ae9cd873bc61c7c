//! Example 03: Streaming Classification
//!
//! This example demonstrates how to:
//! - Start the engine from configuration, falling back to physics-only when
//!   the model artifacts are missing
//! - Classify a replayed stream of readings from several nodes
//! - Gate alert delivery through the per-node cooldown
//!
//! Pass a config file path as the first argument to override the defaults.

use railguard_core::SensorReading;
use railguard_engine::{AlertCooldown, DecisionEngine, EngineConfig, EngineResult};

/// Replayed telemetry: (node, accel, mag_z) at one reading per second
fn replay() -> Vec<SensorReading> {
    let mut stream = Vec::new();

    for second in 0..90u64 {
        for node in ["KM-104", "KM-105"] {
            let (accel, mag_z) = match (node, second) {
                // Fastening pried loose on KM-105
                ("KM-105", 30..=40) => ([11.0, 8.5, 14.0], 160.0),
                // Passing train shakes everything a little
                (_, 60..=65) => ([0.8, 0.5, 10.4], 47.0),
                _ => ([0.05, 0.02, 9.81], 47.0),
            };

            let mut reading = SensorReading::new(node, accel);
            reading.timestamp = 1_718_000_000_000 + second * 1000;
            reading.mag_z = mag_z;
            reading.temperature = 31.0;
            reading.humidity = 60.0;
            reading.pressure = 100_900.0;
            reading.latitude = 12.9716;
            reading.longitude = 77.5946;
            stream.push(reading);
        }
    }

    stream
}

fn main() -> EngineResult<()> {
    println!("=== RailGuard Streaming Classification ===\n");

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    let engine = DecisionEngine::from_config(&config)?;
    let alerts = AlertCooldown::new(config.alert_cooldown_ms);
    println!("Engine mode: {}\n", engine.mode());

    let mut flagged = 0;
    for reading in replay() {
        let response = engine.process(&reading);
        if response.is_anomaly {
            flagged += 1;
        }

        if alerts.should_alert(reading.timestamp, &response) {
            if let Ok(json) = serde_json::to_string(&response) {
                println!("{}", json);
            }
            println!(
                "ALERT {} [{}] score {:.2}: {}",
                response.node_id,
                response.severity,
                response.anomaly_score,
                response.reasons.join("; ")
            );
        }
    }

    println!("\nFlagged readings: {}", flagged);
    println!("Tracked nodes:    {}", engine.tracked_nodes());
    for node in ["KM-104", "KM-105"] {
        if let Some(stats) = engine.store().stats(node) {
            println!(
                "  {}: window {} samples, mean {:.3}, std {:.3}",
                node, stats.count, stats.mean, stats.std_dev
            );
        }
    }

    Ok(())
}
