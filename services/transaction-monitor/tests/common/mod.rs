//! Test helpers shared by the integration suites

#![allow(dead_code)]

use std::{
    sync::{Arc, Once},
    time::Duration,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transaction_monitor::{
    InMemTransactionRepository, MonitorConfig, RepositoryConfig, TransactionRepository,
    TransactionStatistics,
    repository::{Clock, ManualClock},
};

/// Fixed "now" used with [`ManualClock`]
pub const NOW: i64 = 1_700_000_000_000;

/// Sweep period short enough to keep the suites fast
pub const TEST_SWEEP_INTERVAL_MS: u64 = 20;

static INIT: Once = Once::new();

/// Initialize tracing once across all tests
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "transaction_monitor=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

pub fn create_test_config() -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.server.port = 0;
    config.repository.sweep_interval_ms = TEST_SWEEP_INTERVAL_MS;
    config.monitoring.metrics_enabled = false;
    config
}

/// Repository driven by a manual clock pinned at [`NOW`]
pub fn manual_repository() -> (Arc<InMemTransactionRepository>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(NOW));
    let config = RepositoryConfig {
        sweep_interval_ms: TEST_SWEEP_INTERVAL_MS,
    };
    let repository =
        InMemTransactionRepository::with_clock(&config, Arc::clone(&clock) as Arc<dyn Clock>)
            .expect("repository should start inside a runtime");
    (Arc::new(repository), clock)
}

/// Polls published statistics until `predicate` holds or five seconds pass
pub async fn wait_for_statistics<R, P>(repository: &R, predicate: P) -> TransactionStatistics
where
    R: TransactionRepository + ?Sized,
    P: Fn(&TransactionStatistics) -> bool,
{
    let result = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let statistics = repository.get_statistics();
            if predicate(&statistics) {
                return statistics;
            }
            tokio::time::sleep(Duration::from_millis(TEST_SWEEP_INTERVAL_MS / 2)).await;
        }
    })
    .await;

    match result {
        Ok(statistics) => statistics,
        Err(_) => panic!(
            "statistics never reached the expected state, last: {:?}",
            repository.get_statistics()
        ),
    }
}

/// Waits long enough for at least two full sweeps
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(TEST_SWEEP_INTERVAL_MS * 3)).await;
}
