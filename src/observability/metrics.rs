//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mirror_requests_total` (counter): requests by method, status
//! - `mirror_request_duration_seconds` (histogram): latency distribution
//! - `mirror_cache_events_total` (counter): hit, miss_stored, bypass
//! - `mirror_cache_entries` (gauge): entries currently stored
//! - `mirror_upstream_errors_total` (counter): timeout, connect, protocol

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "mirror_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("mirror_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_cache_event(outcome: &'static str) {
    counter!("mirror_cache_events_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("mirror_cache_entries").set(entries as f64);
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("mirror_upstream_errors_total", "kind" => kind).increment(1);
}
