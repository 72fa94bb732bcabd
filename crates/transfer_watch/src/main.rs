// Rust guideline compliant 2026-10-16

//! Transfer-watch entry point.
//!
//! Wires the synthetic producer to a `GraphStore` with the rapid-transfer and
//! fan-in detectors subscribed and alerts routed to the log. Prints a risk
//! summary on exit.
//!
//! # Usage
//!
//! ```text
//! # Infinite mode -- press CTRL+C to stop
//! RUST_LOG=info cargo run
//!
//! # Also show per-transfer debug output
//! RUST_LOG=debug cargo run
//! ```

mod adapters;

use std::sync::Arc;
use std::time::Duration;

use adapters::log_alert_sink::LogAlertSink;
use anyhow::Context as _;
use chrono::TimeDelta;
use detectors::{FanInConfig, FanInDetector, RapidTransferConfig, RapidTransferDetector};
use graph::{GraphStore, GraphStoreConfig};
use producer::{Producer, ProducerConfig};

/// Accounts shown in the exit summary.
const SUMMARY_TOP_N: usize = 5;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize the tracing subscriber before any async work.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store_config = GraphStoreConfig::builder()
        .build()
        .context("failed to build graph store config")?;
    let store = GraphStore::with_config(store_config);
    store.set_alert_sink(Arc::new(LogAlertSink::new()));

    let rapid_config = RapidTransferConfig::builder()
        .window(TimeDelta::seconds(60))
        .min_amount(500.0)
        .burst_count(3)
        .build()
        .context("failed to build rapid-transfer config")?;
    store.register_observer(Arc::new(RapidTransferDetector::new(rapid_config)));

    let fan_in_config = FanInConfig::builder()
        .build()
        .context("failed to build fan-in config")?;
    store.register_observer(Arc::new(FanInDetector::new(fan_in_config)));

    // -- Producer: infinite mode by default; press CTRL+C to stop --
    // Set .iterations(500) here for a finite demo run.
    let producer_config = ProducerConfig::builder(40)
        // 50 ms between events keeps logs readable in real time.
        .poll_interval(Duration::from_millis(50))
        .burst_probability(0.03)
        .build()
        .context("failed to build producer config")?;
    let producer = Producer::new(producer_config);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("main.shutdown: ctrl_c received");
        }
        result = producer.run(&store) => {
            result.context("producer failed")?;
        }
    }

    report(&store);
    Ok(())
}

/// Log totals and the riskiest accounts.
fn report(store: &GraphStore) {
    tracing::info!(
        transfers = store.log().len(),
        accounts = store.registry().len(),
        alerts = store.alerts_emitted(),
        "main.summary"
    );
    for (rank, account) in store.top_risk(SUMMARY_TOP_N).iter().enumerate() {
        tracing::info!(rank = rank + 1, account = %account.name, risk = account.risk, "main.summary.top_risk");
    }
}
