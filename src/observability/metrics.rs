//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define relay metrics (outcomes, redirects, latency, transfers)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `relay_requests_total` (counter): relay requests by outcome
//! - `relay_redirects_total` (counter): upstream redirects followed
//! - `relay_upstream_latency_seconds` (histogram): time to final upstream headers
//! - `relay_transfers_total` (counter): body transfers by result
//! - `relay_bytes_total` (counter): body bytes forwarded downstream
//! - `catalog_queries_total` (counter): catalog listing requests
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op, so library code
//!   and tests never need to set one up

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("relay_requests_total", "Relay requests by outcome");
    describe_counter!("relay_redirects_total", "Upstream redirects followed");
    describe_histogram!(
        "relay_upstream_latency_seconds",
        Unit::Seconds,
        "Time from dispatch to final upstream response headers"
    );
    describe_counter!("relay_transfers_total", "Body transfers by result");
    describe_counter!("relay_bytes_total", Unit::Bytes, "Body bytes forwarded downstream");
    describe_counter!("catalog_queries_total", "Catalog listing requests");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_relay_outcome(outcome: &'static str) {
    counter!("relay_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_redirect() {
    counter!("relay_redirects_total").increment(1);
}

pub fn record_upstream_latency(start: Instant) {
    histogram!("relay_upstream_latency_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_transfer(result: &'static str, bytes: u64) {
    counter!("relay_transfers_total", "result" => result).increment(1);
    counter!("relay_bytes_total").increment(bytes);
}

pub fn record_catalog_query() {
    counter!("catalog_queries_total").increment(1);
}
