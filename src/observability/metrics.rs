//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tablelink_connect_total` (counter): connect attempts by outcome
//! - `tablelink_connect_duration_seconds` (histogram): time to connected signal
//! - `tablelink_resolutions_total` (counter): resolutions by strategy, outcome
//! - `tablelink_active_listeners` (gauge): registered group listeners
//! - `tablelink_teardowns_total` (counter): connections torn down
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_connect(outcome: &'static str, elapsed: Duration) {
    metrics::counter!("tablelink_connect_total", "outcome" => outcome).increment(1);
    metrics::histogram!("tablelink_connect_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_resolution(strategy: &'static str, outcome: &'static str) {
    metrics::counter!(
        "tablelink_resolutions_total",
        "strategy" => strategy,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_active_listeners(count: usize) {
    metrics::gauge!("tablelink_active_listeners").set(count as f64);
}

pub fn record_teardown() {
    metrics::counter!("tablelink_teardowns_total").increment(1);
}
