//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tube_requests_total` (counter): dispatched requests by method, status
//! - `tube_request_duration_seconds` (histogram): dispatch latency
//! - `tube_route_cache_total` (counter): request cache lookups by result
//! - `tube_document_cache_total` (counter): document cache lookups by result
//!
//! Recording is a no-op until a recorder is installed, so the library can be
//! used without the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished dispatch.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "tube_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("tube_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

fn cache_result(hit: bool) -> &'static str {
    if hit {
        "hit"
    } else {
        "miss"
    }
}

/// Record a request cache lookup.
pub fn record_route_cache(hit: bool) {
    counter!("tube_route_cache_total", "result" => cache_result(hit)).increment(1);
}

/// Record a document cache lookup.
pub fn record_document_cache(hit: bool) {
    counter!("tube_document_cache_total", "result" => cache_result(hit)).increment(1);
}
