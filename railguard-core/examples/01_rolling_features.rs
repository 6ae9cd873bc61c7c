//! Example 01: Rolling Features and Physics Rules
//!
//! This example demonstrates how to:
//! - Feed readings from several nodes through one shared feature builder
//! - Watch a node's rolling window warm up and then evict its oldest samples
//! - Apply the violent-shake threshold ahead of any learned model
//! - Reject non-finite readings without touching the node's history

use railguard_core::{FeatureBuilder, SensorReading, ThresholdRule, TiltRule, WINDOW};

fn main() {
    println!("=== RailGuard Rolling Features Example ===\n");

    let builder = FeatureBuilder::new();
    let shake = ThresholdRule::default();
    let tilt = TiltRule;

    println!("Phase 1: quiet rail on two nodes");
    println!("--------------------------------");
    for i in 0..WINDOW + 5 {
        let wobble = (i % 5) as f64 * 0.02;
        for node in ["N-01", "N-02"] {
            let reading = SensorReading::new(node, [wobble, 0.1, 9.8]);
            match builder.build(&reading) {
                Ok(features) if i % 10 == 0 && node == "N-01" => println!(
                    "  reading {:>2}: accel_mag {:.3}, accel_std {:.4}, window {}",
                    i,
                    features.accel_mag,
                    features.accel_std,
                    builder.store().len(node)
                ),
                Ok(_) => {}
                Err(e) => println!("  rejected: {}", e),
            }
        }
    }
    println!("  nodes tracked: {}", builder.store().node_count());

    println!("\nPhase 2: someone shakes N-01");
    println!("----------------------------");
    for accel in [[2.0, 1.0, 11.0], [12.0, 9.0, 13.0], [20.0, 10.0, 12.0]] {
        let reading = SensorReading::new("N-01", accel);
        let Ok(features) = builder.build(&reading) else {
            continue;
        };

        let verdict = shake
            .evaluate(features.accel_mag)
            .or_else(|| tilt.evaluate(&reading));
        match verdict {
            Some(hit) => println!(
                "  accel_mag {:>6.2}: {} score {:.2} ({})",
                features.accel_mag, hit.severity, hit.score, hit.reason
            ),
            None => println!("  accel_mag {:>6.2}: below threshold, model stage decides", features.accel_mag),
        }
    }

    if let Some(stats) = builder.store().stats("N-01") {
        println!(
            "  N-01 window: {} samples, mean {:.3}, std {:.3}, range {:.3}",
            stats.count, stats.mean, stats.std_dev, stats.range
        );
    }

    println!("\nPhase 3: a corrupt frame");
    println!("------------------------");
    let before = builder.store().snapshot("N-02");
    let mut corrupt = SensorReading::new("N-02", [0.0, 0.0, 9.8]);
    corrupt.mag_y = f64::NAN;

    match builder.build(&corrupt) {
        Ok(_) => println!("  unexpectedly accepted"),
        Err(e) => println!("  rejected: {}", e),
    }
    println!(
        "  N-02 history unchanged: {}",
        before == builder.store().snapshot("N-02")
    );
}
