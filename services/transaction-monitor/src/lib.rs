//! Transaction Monitor
//!
//! Ingests timestamped monetary transactions and serves statistics
//! (count, sum, average, min, max) over the trailing 60 seconds.
//! Features:
//! - Concurrent in-memory store with periodic eviction
//! - Atomically published statistics snapshots
//! - REST API with request logging and Prometheus metrics

use anyhow::Result;

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod server;

pub use config::{MonitorConfig, MonitoringConfig, ServerConfig};
pub use repository::{
    InMemTransactionRepository, RepositoryConfig, Transaction, TransactionRepository,
    TransactionStatistics,
};
pub use server::{MonitorServer, create_app};

/// Start the transaction monitor server
pub async fn start_server(config: MonitorConfig) -> Result<()> {
    let metrics_enabled = config.monitoring.metrics_enabled;
    let mut server = MonitorServer::new(config)?;
    if metrics_enabled {
        match metrics::install_exporter() {
            Ok(handle) => server = server.with_metrics(handle),
            Err(e) => tracing::warn!("Metrics exporter not installed: {}", e),
        }
    }
    server.start().await
}
