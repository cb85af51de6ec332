//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lifecycle_init_total` (counter): init calls by outcome
//! - `lifecycle_stop_total` (counter): stop calls by outcome
//! - `lifecycle_worker_launch_total` (counter): launches by mode (async, sync)
//! - `lifecycle_worker_exit_total` (counter): worker returns by result
//! - `lifecycle_service_status_total` (counter): status reports by state
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_init(outcome: &'static str) {
    metrics::counter!("lifecycle_init_total", "outcome" => outcome).increment(1);
}

pub fn record_stop(outcome: &'static str) {
    metrics::counter!("lifecycle_stop_total", "outcome" => outcome).increment(1);
}

pub fn record_worker_launch(mode: &'static str) {
    metrics::counter!("lifecycle_worker_launch_total", "mode" => mode).increment(1);
}

pub fn record_worker_exit(result: &'static str) {
    metrics::counter!("lifecycle_worker_exit_total", "result" => result).increment(1);
}

pub fn record_service_status(state: &'static str) {
    metrics::counter!("lifecycle_service_status_total", "state" => state).increment(1);
}
