//! Metrics collection and exposition.
//!
//! # Metrics
//! - `provisioner_operations_total` (counter): operations by name, outcome
//! - `provisioner_operation_duration_seconds` (histogram): latency per operation
//! - `provisioner_reloads_total` (counter): reload attempts by outcome
//! - `provisioner_rollbacks_total` (counter): documents restored after a failure
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_operation(operation: &'static str, outcome: &'static str, start: Instant) {
    ::metrics::counter!(
        "provisioner_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!("provisioner_operation_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_reload(outcome: &'static str) {
    ::metrics::counter!("provisioner_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_rollback() {
    ::metrics::counter!("provisioner_rollbacks_total").increment(1);
}
