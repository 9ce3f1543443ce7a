//! Configuration for the transaction monitor

use anyhow::Result;
use serde::{Deserialize, Serialize};
use services_common::{
    DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT, DEFAULT_MAX_BODY_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS,
    ServiceError,
};

use crate::repository::RepositoryConfig;

/// Ingest route, fixed by the API contract
pub const TRANSACTIONS_PATH: &str = "/transactions";
/// Statistics route, fixed by the API contract
pub const STATISTICS_PATH: &str = "/statistics";

/// Transaction monitor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MonitorConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Sliding-window repository configuration
    pub repository: RepositoryConfig,
    /// Monitoring configuration
    pub monitoring: MonitoringConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port, 0 picks an ephemeral port
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

/// Monitoring and metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Enable Prometheus metrics
    pub metrics_enabled: bool,
    /// Metrics endpoint path
    pub metrics_path: String,
    /// Health check endpoint path
    pub health_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            metrics_path: "/metrics".to_string(),
            health_path: "/health".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from file, overridden by `MONITOR__*` variables
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("MONITOR").separator("__"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.server.host.trim().is_empty() {
            return Err(ServiceError::InvalidConfiguration(
                "server.host must not be empty".to_string(),
            ));
        }
        if self.repository.sweep_interval_ms == 0 {
            return Err(ServiceError::InvalidConfiguration(
                "repository.sweep_interval_ms must be positive".to_string(),
            ));
        }
        for path in [&self.monitoring.metrics_path, &self.monitoring.health_path] {
            if !path.starts_with('/') {
                return Err(ServiceError::InvalidConfiguration(format!(
                    "route '{path}' must start with '/'"
                )));
            }
            if path == TRANSACTIONS_PATH || path == STATISTICS_PATH {
                return Err(ServiceError::InvalidConfiguration(format!(
                    "route '{path}' is reserved"
                )));
            }
        }
        if self.monitoring.metrics_path == self.monitoring.health_path {
            return Err(ServiceError::InvalidConfiguration(format!(
                "metrics and health routes both use '{}'",
                self.monitoring.health_path
            )));
        }
        Ok(())
    }

    /// Get server address
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
