//! In-memory repository facade

use serde::{Deserialize, Serialize};
use services_common::{DEFAULT_SWEEP_INTERVAL_MS, ServiceError};
use std::{sync::Arc, time::Duration};
use tracing::debug;

use super::{
    Clock, StatisticsAggregator, Sweep, SweepScheduler, SystemClock, Transaction,
    TransactionRepository, TransactionStatistics, TransactionStore,
};
use crate::metrics;

/// Repository tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Period between two sweeps; bounds staleness of published statistics
    pub sweep_interval_ms: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

impl RepositoryConfig {
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// Store, aggregator and sweep scheduler owned as one unit
///
/// Must be created inside a tokio runtime. Dropping the repository stops the
/// scheduler; the last published statistics stay readable until then.
pub struct InMemTransactionRepository {
    store: Arc<TransactionStore>,
    aggregator: Arc<StatisticsAggregator>,
    scheduler: SweepScheduler,
    clock: Arc<dyn Clock>,
}

impl InMemTransactionRepository {
    /// Creates a repository reading the wall clock
    pub fn new(config: &RepositoryConfig) -> Result<Self, ServiceError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RepositoryConfig, clock: Arc<dyn Clock>) -> Result<Self, ServiceError> {
        let store = Arc::new(TransactionStore::new());
        let aggregator = Arc::new(StatisticsAggregator::new());
        let sweep = Sweep::new(Arc::clone(&store), Arc::clone(&aggregator), Arc::clone(&clock));
        let scheduler = SweepScheduler::spawn(sweep, config.sweep_interval())?;

        Ok(Self {
            store,
            aggregator,
            scheduler,
            clock,
        })
    }

    /// Stops any pending sweep
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    /// Stops the scheduler and waits for the running sweep, if any
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}

impl TransactionRepository for InMemTransactionRepository {
    fn add_transaction(&self, transaction: Transaction) -> bool {
        let accepted = transaction.in_window(self.clock.now_millis());
        if accepted {
            debug!("Add transaction");
            self.store.insert(transaction);
        } else {
            debug!(timestamp = transaction.timestamp(), "Transaction outside window");
        }
        metrics::record_transaction(accepted);

        accepted
    }

    fn get_statistics(&self) -> TransactionStatistics {
        debug!("Get statistics");
        self.aggregator.current()
    }

    fn retained_transactions(&self) -> usize {
        self.store.retained()
    }
}
