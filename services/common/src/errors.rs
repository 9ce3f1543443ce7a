//! Common error types for services

use thiserror::Error;

/// Service error types
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Configuration could not be loaded or failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A background component could not be started
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}
