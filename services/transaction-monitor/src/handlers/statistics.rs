//! Statistics query handler

use axum::{extract::State, response::Json};
use std::sync::Arc;

use crate::repository::{TransactionRepository, TransactionStatistics};

#[derive(Clone)]
pub struct StatisticsHandlers {
    repository: Arc<dyn TransactionRepository>,
}

impl StatisticsHandlers {
    pub fn new(repository: Arc<dyn TransactionRepository>) -> Self {
        Self { repository }
    }

    /// `GET /statistics`, served from the last published snapshot
    pub async fn get_statistics(State(handlers): State<Self>) -> Json<TransactionStatistics> {
        Json(handlers.repository.get_statistics())
    }
}
