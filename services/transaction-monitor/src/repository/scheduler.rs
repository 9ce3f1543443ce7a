//! Recurring evict-then-recompute sweep

use parking_lot::Mutex;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

use super::{Clock, StatisticsAggregator, StatisticsError, TransactionStore};
use crate::metrics;
use services_common::ServiceError;

/// Outcome of one successful sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// The "now" every window check of this sweep used
    pub now: i64,
    pub evicted: usize,
    pub retained: usize,
    /// `count` of the statistics this sweep published
    pub published_count: u64,
}

/// One unit of sweep work over a store and an aggregator
#[derive(Clone)]
pub struct Sweep {
    store: Arc<TransactionStore>,
    aggregator: Arc<StatisticsAggregator>,
    clock: Arc<dyn Clock>,
}

impl Sweep {
    pub fn new(
        store: Arc<TransactionStore>,
        aggregator: Arc<StatisticsAggregator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            aggregator,
            clock,
        }
    }

    /// Evicts expired transactions, then recomputes and publishes.
    ///
    /// On error nothing is published and the previous snapshot stays visible.
    pub fn run(&self) -> Result<SweepReport, StatisticsError> {
        let now = self.clock.now_millis();
        let evicted = self.store.evict_expired(now);
        let amounts = self.store.snapshot_amounts();
        let statistics = StatisticsAggregator::recompute(&amounts)?;
        let published_count = statistics.count;
        self.aggregator.publish(statistics);

        Ok(SweepReport {
            now,
            evicted,
            retained: amounts.len(),
            published_count,
        })
    }
}

/// Background task running a [`Sweep`] at a fixed interval
///
/// The next tick is scheduled only after the current one finished, so ticks
/// never overlap.
pub struct SweepScheduler {
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SweepScheduler {
    /// Spawns the sweep loop on the current tokio runtime
    pub fn spawn(sweep: Sweep, interval: Duration) -> Result<Self, ServiceError> {
        let runtime = Handle::try_current().map_err(|e| {
            ServiceError::ServiceUnavailable(format!("sweep scheduler needs a tokio runtime: {e}"))
        })?;
        if interval.is_zero() {
            return Err(ServiceError::InvalidConfiguration(
                "sweep interval must be positive".to_string(),
            ));
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = runtime.spawn(run_loop(sweep, interval, shutdown_rx));
        info!("Sweep scheduler started with interval {:?}", interval);

        Ok(Self {
            shutdown_tx,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Cancels the pending tick. Safe to call repeatedly.
    pub fn stop(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!("Stopping sweep scheduler");
        }
    }

    /// Stops the scheduler and waits for the loop to exit
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Sweep scheduler task failed during shutdown: {}", e);
            }
        }
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

impl Drop for SweepScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop(sweep: Sweep, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            biased;
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
            () = tokio::time::sleep(interval) => {}
        }

        if *shutdown_rx.borrow() {
            break;
        }

        run_tick(&sweep).await;
    }

    info!("Sweep scheduler stopped");
}

async fn run_tick(sweep: &Sweep) {
    let started = Instant::now();
    let work = sweep.clone();

    match tokio::task::spawn_blocking(move || work.run()).await {
        Ok(Ok(report)) => {
            if report.evicted > 0 {
                debug!(
                    now = report.now,
                    evicted = report.evicted,
                    retained = report.retained,
                    "Sweep evicted expired transactions"
                );
            }
            metrics::record_sweep(report.retained, report.published_count, started.elapsed());
        }
        Ok(Err(e)) => {
            warn!("Sweep failed, keeping previous statistics: {}", e);
            metrics::record_sweep_failure("statistics");
        }
        Err(e) => {
            let err = ServiceError::InternalError(format!("sweep task panicked: {e}"));
            error!("{}", err);
            metrics::record_sweep_failure("panic");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{ManualClock, Transaction};
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicBool, Ordering};

    const NOW: i64 = 1_700_000_000_000;

    /// Clock whose first reading panics, then reads a fixed time
    struct PanicOnceClock {
        panicked: AtomicBool,
        now: i64,
    }

    impl Clock for PanicOnceClock {
        fn now_millis(&self) -> i64 {
            if !self.panicked.swap(true, Ordering::SeqCst) {
                panic!("clock unavailable");
            }
            self.now
        }
    }

    fn sweep_with(clock: Arc<ManualClock>) -> (Sweep, Arc<TransactionStore>, Arc<StatisticsAggregator>) {
        let store = Arc::new(TransactionStore::new());
        let aggregator = Arc::new(StatisticsAggregator::new());
        let sweep = Sweep::new(Arc::clone(&store), Arc::clone(&aggregator), clock);
        (sweep, store, aggregator)
    }

    #[test]
    fn test_sweep_evicts_then_publishes() {
        let clock = Arc::new(ManualClock::new(NOW));
        let (sweep, store, aggregator) = sweep_with(Arc::clone(&clock));

        store.insert(Transaction::new(Decimal::from(300), NOW - 59_400));
        store.insert(Transaction::new(Decimal::from(500), NOW));

        let report = sweep.run().unwrap();
        assert_eq!(
            report,
            SweepReport {
                now: NOW,
                evicted: 0,
                retained: 2,
                published_count: 2,
            }
        );
        assert_eq!(aggregator.current().count, 2);

        clock.advance(1_000);
        let report = sweep.run().unwrap();
        assert_eq!(report.evicted, 1);
        assert_eq!(aggregator.current().count, 1);
        assert_eq!(aggregator.current().sum, Decimal::from(500));
    }

    #[test]
    fn test_failed_sweep_keeps_previous_snapshot() {
        let clock = Arc::new(ManualClock::new(NOW));
        let (sweep, store, aggregator) = sweep_with(clock);

        store.insert(Transaction::new(Decimal::MAX, NOW));
        sweep.run().unwrap();
        let published = aggregator.current();

        store.insert(Transaction::new(Decimal::MAX, NOW));
        assert!(sweep.run().is_err());
        assert_eq!(aggregator.current(), published);
    }

    #[test]
    fn test_spawn_without_runtime_fails() {
        let clock = Arc::new(ManualClock::new(NOW));
        let (sweep, _, _) = sweep_with(clock);
        let result = SweepScheduler::spawn(sweep, Duration::from_millis(10));
        assert!(matches!(result, Err(ServiceError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_zero_interval_is_rejected() {
        let clock = Arc::new(ManualClock::new(NOW));
        let (sweep, _, _) = sweep_with(clock);
        let result = SweepScheduler::spawn(sweep, Duration::ZERO);
        assert!(matches!(result, Err(ServiceError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_scheduler_publishes_and_stops() {
        let clock = Arc::new(ManualClock::new(NOW));
        let (sweep, store, aggregator) = sweep_with(clock);
        store.insert(Transaction::new(Decimal::from(42), NOW));

        let scheduler = SweepScheduler::spawn(sweep, Duration::from_millis(10)).unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while aggregator.current().count != 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("sweep never published");

        scheduler.shutdown().await;
        scheduler.stop();
        assert!(scheduler.is_stopped());

        store.insert(Transaction::new(Decimal::from(1), NOW));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(aggregator.current().count, 1);
    }

    #[tokio::test]
    async fn test_scheduler_survives_failed_ticks() {
        let clock = Arc::new(ManualClock::new(NOW));
        let (sweep, store, aggregator) = sweep_with(Arc::clone(&clock));
        store.insert(Transaction::new(Decimal::MAX, NOW));
        store.insert(Transaction::new(Decimal::MAX, NOW));

        let scheduler = SweepScheduler::spawn(sweep, Duration::from_millis(10)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(aggregator.current().count, 0);

        // Once the overflowing pair ages out the next tick succeeds again
        clock.advance(60_000);
        store.insert(Transaction::new(Decimal::from(7), NOW + 60_000));
        tokio::time::timeout(Duration::from_secs(5), async {
            while aggregator.current().count != 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("scheduler stopped after a failed tick");

        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_scheduler_keeps_ticking_after_a_panicked_sweep() {
        let clock = Arc::new(PanicOnceClock {
            panicked: AtomicBool::new(false),
            now: NOW,
        });
        let store = Arc::new(TransactionStore::new());
        let aggregator = Arc::new(StatisticsAggregator::new());
        let sweep = Sweep::new(Arc::clone(&store), Arc::clone(&aggregator), Arc::clone(&clock) as Arc<dyn Clock>);
        store.insert(Transaction::new(Decimal::from(9), NOW));

        let scheduler = SweepScheduler::spawn(sweep, Duration::from_millis(10)).unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while aggregator.current().count != 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("scheduler stopped after a panicked tick");

        assert!(clock.panicked.load(Ordering::SeqCst));
        assert_eq!(aggregator.current().sum, Decimal::from(9));
        scheduler.shutdown().await;
    }
}
