//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hostbox_component_starts_total` (counter): components started
//! - `hostbox_component_faults_total{phase}` (counter): start/stop faults
//! - `hostbox_phase_duration_seconds{phase}` (histogram): start and stop wait time
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::MetricsSettings;

/// Install the Prometheus recorder and scrape endpoint if enabled.
///
/// Failures are logged; the host runs without metrics rather than failing.
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        return;
    }
    let addr: SocketAddr = match settings.address.parse() {
        Ok(addr) => addr,
        Err(_) => {
            tracing::error!(metrics_address = %settings.address, "Failed to parse metrics address");
            return;
        }
    };

    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_metrics();
            tracing::info!(address = %addr, "Metrics endpoint listening");
        }
        Err(error) => tracing::error!(error = %error, "Failed to install metrics exporter"),
    }
}

fn describe_metrics() {
    describe_counter!("hostbox_component_starts_total", "Components started successfully");
    describe_counter!(
        "hostbox_component_faults_total",
        "Component faults by lifecycle phase (start, stop)"
    );
    describe_histogram!(
        "hostbox_phase_duration_seconds",
        "Time spent waiting for a lifecycle phase to finish"
    );
}

pub fn record_component_start() {
    metrics::counter!("hostbox_component_starts_total").increment(1);
}

pub fn record_component_fault(phase: &'static str) {
    metrics::counter!("hostbox_component_faults_total", "phase" => phase).increment(1);
}

pub fn record_phase_duration(phase: &'static str, elapsed: Duration) {
    metrics::histogram!("hostbox_phase_duration_seconds", "phase" => phase).record(elapsed.as_secs_f64());
}
