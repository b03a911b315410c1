//! Metrics collection and exposition.
//!
//! # Metrics
//! - `harness_scenarios_total` (counter): verdicts by outcome and pass/fail
//! - `harness_scenario_duration_seconds` (histogram): wall time per scenario
//! - `harness_bytes_transferred_total` (counter): bytes by direction

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::gateway::Direction;
use crate::scenario::Verdict;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_verdict(verdict: &Verdict, elapsed: Duration) {
    let passed = if verdict.passed { "true" } else { "false" };
    metrics::counter!(
        "harness_scenarios_total",
        "outcome" => verdict.actual.as_str(),
        "passed" => passed
    )
    .increment(1);
    metrics::histogram!("harness_scenario_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_transfer(direction: Direction, bytes: u64) {
    let direction = match direction {
        Direction::Download => "download",
        Direction::Upload => "upload",
        Direction::Probe => "probe",
    };
    metrics::counter!("harness_bytes_transferred_total", "direction" => direction).increment(bytes);
}
