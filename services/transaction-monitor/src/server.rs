//! Transaction monitor HTTP server

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::{get, post},
};
use std::{future::Future, net::SocketAddr, sync::Arc, time::{Duration, Instant}};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    config::{MonitorConfig, STATISTICS_PATH, TRANSACTIONS_PATH},
    handlers::{HealthHandlers, StatisticsHandlers, TransactionHandlers},
    metrics::MetricsHandle,
    middleware::logging_middleware,
    repository::{InMemTransactionRepository, TransactionRepository},
};

/// Unified application state containing all handlers
#[derive(Clone, FromRef)]
pub struct AppState {
    pub transaction_handlers: TransactionHandlers,
    pub statistics_handlers: StatisticsHandlers,
    pub health_handlers: HealthHandlers,
}

/// Builds the router over any repository implementation
pub fn create_app(
    config: &MonitorConfig,
    repository: Arc<dyn TransactionRepository>,
    metrics: Option<MetricsHandle>,
) -> Router {
    let app_state = AppState {
        transaction_handlers: TransactionHandlers::new(Arc::clone(&repository)),
        statistics_handlers: StatisticsHandlers::new(Arc::clone(&repository)),
        health_handlers: HealthHandlers::new(repository, Instant::now(), metrics),
    };

    Router::new()
        .route(&config.monitoring.health_path, get(HealthHandlers::health_check))
        .route(&config.monitoring.metrics_path, get(HealthHandlers::metrics))
        .route(TRANSACTIONS_PATH, post(TransactionHandlers::add_transaction))
        .route(STATISTICS_PATH, get(StatisticsHandlers::get_statistics))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.timeout_seconds,
        )))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Transaction monitor server
pub struct MonitorServer {
    config: MonitorConfig,
    repository: Arc<InMemTransactionRepository>,
    metrics: Option<MetricsHandle>,
}

impl MonitorServer {
    /// Creates the server and starts the repository's sweep scheduler
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        let repository = Arc::new(
            InMemTransactionRepository::new(&config.repository)
                .context("Failed to start transaction repository")?,
        );
        info!("Transaction repository initialized");

        Ok(Self {
            config,
            repository,
            metrics: None,
        })
    }

    /// Serves `GET /metrics` from the given exporter
    #[must_use]
    pub fn with_metrics(mut self, handle: MetricsHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    #[must_use]
    pub fn repository(&self) -> Arc<InMemTransactionRepository> {
        Arc::clone(&self.repository)
    }

    /// Binds the configured address and serves until Ctrl+C / SIGTERM
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .server_address()
            .parse()
            .with_context(|| format!("Invalid server address '{}'", self.config.server_address()))?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to address {addr}"))?;
        info!("Starting transaction monitor on {}", addr);

        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves, then
    /// stops the sweep scheduler
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let repository: Arc<dyn TransactionRepository> = self.repository.clone();
        let app = create_app(&self.config, repository, self.metrics.clone());

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        self.repository.shutdown().await;
        info!("Transaction monitor stopped");

        if let Err(e) = result {
            error!("Server encountered a fatal error: {}", e);
            return Err(anyhow::anyhow!("Server error: {}", e));
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received terminate signal"),
    }
}

/// API route documentation
pub fn print_routes(config: &MonitorConfig) {
    println!("Transaction Monitor Routes:");
    println!("===========================");
    println!();
    println!("  POST /transactions           - Record a transaction");
    println!("                                 201 accepted, 204 older than 60s, 400 invalid");
    println!("  GET  /statistics             - Statistics over the last 60 seconds");
    println!("  GET  {:<24}- Health check", config.monitoring.health_path);
    println!("  GET  {:<24}- Prometheus metrics", config.monitoring.metrics_path);
}
