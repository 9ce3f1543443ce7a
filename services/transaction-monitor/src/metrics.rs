//! Prometheus metrics for the transaction monitor
//!
//! Covers:
//! - Ingest outcomes (accepted / rejected transactions)
//! - Sweep duration, failures and retained transaction count
//! - HTTP requests by method, path and status
//!
//! Every recorder is a no-op when the `monitoring` feature is disabled or no
//! exporter has been installed.

use std::time::Duration;

#[cfg(feature = "monitoring")]
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Handle used to render the Prometheus exposition
#[cfg(feature = "monitoring")]
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

#[cfg(not(feature = "monitoring"))]
#[derive(Debug, Clone)]
pub struct MetricsHandle;

#[cfg(feature = "monitoring")]
fn register_metrics() {
    describe_counter!(
        "transaction_monitor_transactions_total",
        "Transactions received, by outcome"
    );
    describe_counter!(
        "transaction_monitor_sweep_failures_total",
        "Sweeps that did not publish statistics"
    );
    describe_histogram!(
        "transaction_monitor_sweep_duration_seconds",
        "Time spent evicting and recomputing statistics"
    );
    describe_gauge!(
        "transaction_monitor_retained_transactions",
        "Transactions inside the window after the last sweep"
    );
    describe_gauge!(
        "transaction_monitor_published_count",
        "Count carried by the currently published statistics"
    );
    describe_counter!(
        "transaction_monitor_http_requests_total",
        "Total number of HTTP requests"
    );
    describe_histogram!(
        "transaction_monitor_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
}

/// Installs the global Prometheus recorder. Fails if one is already installed.
#[cfg(feature = "monitoring")]
pub fn install_exporter() -> anyhow::Result<MetricsHandle> {
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(handle)
}

#[cfg(not(feature = "monitoring"))]
pub fn install_exporter() -> anyhow::Result<MetricsHandle> {
    anyhow::bail!("built without the `monitoring` feature")
}

/// Prometheus text exposition of everything recorded so far
#[cfg(feature = "monitoring")]
pub fn render(handle: &MetricsHandle) -> String {
    handle.render()
}

#[cfg(not(feature = "monitoring"))]
pub fn render(_handle: &MetricsHandle) -> String {
    String::new()
}

pub fn record_transaction(accepted: bool) {
    #[cfg(feature = "monitoring")]
    counter!("transaction_monitor_transactions_total",
        "outcome" => if accepted { "accepted" } else { "rejected" }
    )
    .increment(1);
    #[cfg(not(feature = "monitoring"))]
    let _ = accepted;
}

pub fn record_sweep(retained: usize, published_count: u64, duration: Duration) {
    #[cfg(feature = "monitoring")]
    {
        // SAFETY: counts safely convert to f64 for metrics
        #[allow(clippy::cast_precision_loss)]
        {
            gauge!("transaction_monitor_retained_transactions").set(retained as f64);
            gauge!("transaction_monitor_published_count").set(published_count as f64);
        }
        histogram!("transaction_monitor_sweep_duration_seconds").record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "monitoring"))]
    let _ = (retained, published_count, duration);
}

pub fn record_sweep_failure(reason: &'static str) {
    #[cfg(feature = "monitoring")]
    counter!("transaction_monitor_sweep_failures_total", "reason" => reason).increment(1);
    #[cfg(not(feature = "monitoring"))]
    let _ = reason;
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    #[cfg(feature = "monitoring")]
    {
        counter!("transaction_monitor_http_requests_total",
            "method" => method.to_string(),
            "path" => path.to_string(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!("transaction_monitor_http_request_duration_seconds",
            "method" => method.to_string(),
            "path" => path.to_string()
        )
        .record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "monitoring"))]
    let _ = (method, path, status, duration);
}
