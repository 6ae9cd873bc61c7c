//! RailGuard Model Training Example
//!
//! Walks the offline pipeline end to end:
//! - Simulate a labeled capture log from a trackside node
//! - Prepare batch features (deltas + rolling std)
//! - Train the scaler and isolation forest, print held-out metrics
//! - Save both artifacts, load them back and score fresh feature vectors
//!
//! ## Scenario
//!
//! A node bolted to a rail sees gravity plus a little passing-train
//! vibration. Every so often someone tampers with the fastening: the node
//! is shaken and a magnet or tool disturbs its field reading.

use railguard_core::FeatureVector;
use railguard_ml::{
    artifact::{MODEL_FILE, SCALER_FILE},
    prepare_features, train, ForestScorer, MLResult, ModelScorer, RawRecord, TrainConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Simulated capture log, roughly 3% tampering
fn simulate_log(rows: usize) -> Vec<RawRecord> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut log = Vec::with_capacity(rows);
    let mut tamper_left: u32 = 0;

    for _ in 0..rows {
        if tamper_left == 0 && rng.gen_bool(0.004) {
            tamper_left = 8;
        }
        let tampered = tamper_left > 0;
        tamper_left = tamper_left.saturating_sub(1);

        let shake = if tampered { 6.0 } else { 0.15 };
        let field = if tampered { 220.0 } else { 48.0 };

        log.push(RawRecord {
            accel_x: rng.gen_range(-shake..shake),
            accel_y: rng.gen_range(-shake..shake),
            accel_z: 9.8 + rng.gen_range(-shake..shake),
            mag_x: field * 0.4 + rng.gen_range(-1.0..1.0),
            mag_y: field * 0.3 + rng.gen_range(-1.0..1.0),
            mag_z: field * 0.86 + rng.gen_range(-1.0..1.0),
            temperature: 31.0 + rng.gen_range(-0.5..0.5),
            humidity: 64.0 + rng.gen_range(-2.0..2.0),
            pressure: 100_900.0 + rng.gen_range(-30.0..30.0),
            latitude: 12.9716,
            longitude: 77.5946,
            is_anomaly: tampered,
        });
    }

    log
}

fn main() -> MLResult<()> {
    println!("=== RailGuard Model Training ===\n");

    let log = simulate_log(4000);
    let rows = prepare_features(&log);
    let labeled = rows.iter().filter(|r| r.is_anomaly).count();
    println!("Prepared {} rows, {} labeled as tampering", rows.len(), labeled);

    let model = train(&rows, &TrainConfig::default())?;
    let report = model.report;

    println!("\nHeld-out evaluation");
    println!("-------------------");
    println!("              predicted normal  predicted tamper");
    println!(
        "actual normal {:>16}  {:>16}",
        report.confusion.true_negatives, report.confusion.false_positives
    );
    println!(
        "actual tamper {:>16}  {:>16}",
        report.confusion.false_negatives, report.confusion.true_positives
    );
    println!("\nAccuracy : {:.4}", report.accuracy);
    println!("Precision: {:.4}", report.precision);
    println!("Recall   : {:.4}", report.recall);
    println!("F1-score : {:.4}", report.f1);

    let dir = std::env::temp_dir().join("railguard-example");
    std::fs::create_dir_all(&dir)?;
    let model_path = dir.join(MODEL_FILE);
    let scaler_path = dir.join(SCALER_FILE);
    model.save(&model_path, &scaler_path)?;
    println!("\nSaved {} and {}", model_path.display(), scaler_path.display());

    let scorer = ForestScorer::load(&model_path, &scaler_path)?;
    let stats = scorer.forest().stats();
    println!(
        "Loaded forest: {} trees, {} nodes, offset {:.4}",
        stats.num_trees, stats.total_nodes, stats.offset
    );

    // Streaming-style vectors: deltas are 0 on the live path
    let quiet = FeatureVector {
        accel_mag: 9.81,
        accel_std: 0.05,
        mag_norm: 48.0,
        temperature: 31.0,
        humidity: 64.0,
        pressure: 100_900.0,
        ..FeatureVector::default()
    };
    let pried = FeatureVector {
        accel_mag: 12.5,
        accel_std: 3.1,
        mag_norm: 215.0,
        ..quiet
    };

    println!("\nScoring");
    println!("-------");
    for (label, features) in [("quiet rail", quiet), ("fastening pried", pried)] {
        let raw = scorer.score(&features)?;
        let verdict = if raw < -0.05 { "ANOMALY" } else { "normal" };
        println!("{:<16} raw {:+.4}  {}", label, raw, verdict);
    }

    Ok(())
}
