//! Transaction ingest handler

use axum::{body::Bytes, extract::State, http::StatusCode};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    models::{RequestError, TransactionRequest},
    repository::TransactionRepository,
};

/// Transaction ingest handlers
#[derive(Clone)]
pub struct TransactionHandlers {
    repository: Arc<dyn TransactionRepository>,
}

impl TransactionHandlers {
    pub fn new(repository: Arc<dyn TransactionRepository>) -> Self {
        Self { repository }
    }

    /// `POST /transactions`
    ///
    /// `201` when the transaction is inside the window, `204` when it is not,
    /// `400` with a plain-text reason when the body is malformed.
    pub async fn add_transaction(
        State(handlers): State<Self>,
        body: Bytes,
    ) -> Result<StatusCode, RequestError> {
        let request = TransactionRequest::from_slice(&body).inspect_err(|e| {
            warn!("Rejected transaction request: {}", e);
        })?;

        if handlers.repository.add_transaction(request.into()) {
            Ok(StatusCode::CREATED)
        } else {
            debug!(timestamp = request.timestamp, "Transaction outside window");
            Ok(StatusCode::NO_CONTENT)
        }
    }
}
