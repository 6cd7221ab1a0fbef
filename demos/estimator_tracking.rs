//! Estimator Tracking Example
//!
//! Stores a trained estimator with its cross-validated scores, renders them,
//! saves the tables to Parquet and opens them again.
//!
//! Run with: RUST_LOG=debug cargo run --example estimator_tracking

use anyhow::{Context, Result};
use arbiter_db::{
    CorpusId, Estimator, Metric, ModelType, OnDelete, Score, Store, StoreConfig, UserId,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Stand-in for a fitted model: anything serde can serialize can be stored.
#[derive(Debug, Serialize, Deserialize)]
struct FittedTree {
    max_depth: u32,
    feature_importances: Vec<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== arbiter-db Estimator Tracking ===\n");

    let data_dir = std::env::temp_dir().join("arbiter-demo");
    let config = StoreConfig::builder()
        .on_delete(OnDelete::Cascade)
        .data_dir(&data_dir)
        .build()?;
    let mut store = Store::with_config(config);

    store.register_user(UserId::new(1), "bbengfort");
    store.register_corpus(CorpusId::new(1), "baleen-2016");

    // -------------------------------------------------------------------------
    // 1. "Train" an estimator and store it
    // -------------------------------------------------------------------------
    println!("1. Storing estimator...");

    let started = Instant::now();
    let model = FittedTree {
        max_depth: 8,
        feature_importances: vec![0.4, 0.35, 0.25],
    };
    let build_time = started.elapsed().max(Duration::from_millis(1));

    let blob = store.encode_estimator(&model)?;
    let estimator = store.create_estimator(
        Estimator::builder(ModelType::Classifier)
            .model_class("DecisionTreeClassifier")
            .model_form("DecisionTreeClassifier(max_depth=8)")
            .estimator(blob)
            .build_time(build_time)
            .owner(UserId::new(1))
            .corpus(CorpusId::new(1))
            .build(),
    )?;

    println!("   {}", store.render_estimator(estimator.id())?);

    // -------------------------------------------------------------------------
    // 2. Record cross-validated scores
    // -------------------------------------------------------------------------
    println!("\n2. Recording scores...");

    let folds = [0.81, 0.84, 0.79, 0.86, 0.83];
    let accuracy = folds.iter().sum::<f64>() / 5.0;

    store.create_score(
        Score::builder(estimator.id(), Metric::Accuracy)
            .score(accuracy)
            .folds(folds.to_vec())
            .build(),
    )?;
    for (label, precision) in [("ham", 0.88), ("spam", 0.74)] {
        store.create_score(
            Score::builder(estimator.id(), Metric::Precision)
                .score(precision)
                .label(label)
                .build(),
        )?;
    }

    for score in store.scores_for(estimator.id()) {
        println!("   {}", store.render_score(score.id())?);
    }

    // -------------------------------------------------------------------------
    // 3. Save and reopen
    // -------------------------------------------------------------------------
    println!("\n3. Saving to {}...", data_dir.display());
    store.save()?;

    let mut reopened = Store::open(store.config().clone())?;
    reopened.register_user(UserId::new(1), "bbengfort");

    let restored = reopened
        .latest_estimator()
        .context("saved store has an estimator")?;
    let tree: FittedTree = restored
        .load_estimator()?
        .context("estimator blob was stored")?;

    println!("   Reopened: {}", reopened.render_estimator(restored.id())?);
    println!("   Scores:   {}", reopened.scores_for(restored.id()).len());
    println!("   Model:    {tree:?}");

    println!("\n=== Done ===");
    Ok(())
}
