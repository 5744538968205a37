//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (RPS, latency, pool reuse, rejections)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `http_requests_total` (counter): total requests by method, status, route
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `context_pool_reused_total` (counter): checkouts served from the pool
//! - `context_pool_allocated_total` (counter): checkouts that allocated
//! - `rate_limited_total` (counter): requests rejected with 429
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Route label is the registered pattern, never the raw path

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    let route = route.to_string();
    ::metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "route" => route.clone()
    )
    .increment(1);
    ::metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "status" => status,
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_pool_checkout(reused: bool) {
    if reused {
        ::metrics::counter!("context_pool_reused_total").increment(1);
    } else {
        ::metrics::counter!("context_pool_allocated_total").increment(1);
    }
}

pub fn record_rate_limited(reason: &'static str) {
    ::metrics::counter!("rate_limited_total", "reason" => reason).increment(1);
}
