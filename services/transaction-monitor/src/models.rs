//! REST API models and request/response types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;

use crate::repository::Transaction;

/// Reasons an ingest request is rejected before reaching the repository
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    #[error("Json is invalid")]
    InvalidJson,
    #[error("Amount is required")]
    AmountRequired,
    #[error("Amount is invalid")]
    AmountInvalid,
    #[error("Timestamp is required")]
    TimestampRequired,
    #[error("Timestamp is invalid")]
    TimestampInvalid,
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

/// Body of `POST /transactions`
///
/// Parsed by hand rather than derived so that every missing or malformed
/// field maps to its own rejection message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionRequest {
    pub amount: Decimal,
    pub timestamp: i64,
}

impl TransactionRequest {
    /// Parses a raw request body
    pub fn from_slice(body: &[u8]) -> Result<Self, RequestError> {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => Self::from_fields(&fields),
            _ => Err(RequestError::InvalidJson),
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Result<Self, RequestError> {
        let amount = match fields.get("amount") {
            None | Some(Value::Null) => return Err(RequestError::AmountRequired),
            Some(Value::Number(n)) => {
                parse_decimal(&n.to_string()).ok_or(RequestError::AmountInvalid)?
            }
            Some(_) => return Err(RequestError::AmountInvalid),
        };

        let timestamp = match fields.get("timestamp") {
            None | Some(Value::Null) => return Err(RequestError::TimestampRequired),
            Some(Value::Number(n)) => n.as_i64().ok_or(RequestError::TimestampInvalid)?,
            Some(_) => return Err(RequestError::TimestampInvalid),
        };

        Ok(Self { amount, timestamp })
    }
}

/// Parses the shortest decimal rendering of a JSON number, including
/// exponent notation such as `1e21`
fn parse_decimal(number: &str) -> Option<Decimal> {
    Decimal::from_str(number)
        .or_else(|_| Decimal::from_scientific(number))
        .ok()
}

impl From<TransactionRequest> for Transaction {
    fn from(request: TransactionRequest) -> Self {
        Self::new(request.amount, request.timestamp)
    }
}

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub retained_transactions: usize,
}
