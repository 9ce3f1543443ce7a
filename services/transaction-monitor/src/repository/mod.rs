//! Sliding-window transaction repository
//!
//! Transactions are accepted only while they fall inside the trailing
//! 60-second window. A background sweep evicts expired entries and
//! republishes an immutable [`TransactionStatistics`] snapshot; readers only
//! ever see the last published snapshot.

pub mod clock;
pub mod in_memory;
pub mod scheduler;
pub mod statistics;
pub mod store;
pub mod transaction;

pub use clock::{Clock, ManualClock, SystemClock};
pub use in_memory::{InMemTransactionRepository, RepositoryConfig};
pub use scheduler::{Sweep, SweepReport, SweepScheduler};
pub use statistics::{StatisticsAggregator, StatisticsError, TransactionStatistics};
pub use store::TransactionStore;
pub use transaction::Transaction;

/// Operations the HTTP layer needs from a transaction repository
pub trait TransactionRepository: Send + Sync {
    /// Stores the transaction if it happened inside the window.
    ///
    /// Returns `true` when the transaction was accepted.
    fn add_transaction(&self, transaction: Transaction) -> bool;

    /// Statistics about the transactions of the last 60 seconds, as of the
    /// most recent sweep
    fn get_statistics(&self) -> TransactionStatistics;

    /// Number of transactions currently retained
    fn retained_transactions(&self) -> usize;
}
