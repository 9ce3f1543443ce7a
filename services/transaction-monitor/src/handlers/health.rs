//! Health check and monitoring handlers

use axum::{extract::State, http::StatusCode, response::Json};
use std::{sync::Arc, time::Instant};
use tracing::debug;

use crate::{metrics::MetricsHandle, models::HealthCheckResponse, repository::TransactionRepository};

/// Health check handlers
#[derive(Clone)]
pub struct HealthHandlers {
    repository: Arc<dyn TransactionRepository>,
    start_time: Instant,
    metrics: Option<MetricsHandle>,
}

impl HealthHandlers {
    pub fn new(
        repository: Arc<dyn TransactionRepository>,
        start_time: Instant,
        metrics: Option<MetricsHandle>,
    ) -> Self {
        Self {
            repository,
            start_time,
            metrics,
        }
    }

    /// Health check endpoint
    pub async fn health_check(State(handlers): State<Self>) -> Json<HealthCheckResponse> {
        debug!("Health check request");

        Json(HealthCheckResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: handlers.start_time.elapsed().as_secs(),
            retained_transactions: handlers.repository.retained_transactions(),
        })
    }

    /// Prometheus metrics endpoint
    pub async fn metrics(State(handlers): State<Self>) -> Result<String, StatusCode> {
        handlers
            .metrics
            .as_ref()
            .map(crate::metrics::render)
            .ok_or(StatusCode::NOT_FOUND)
    }
}
