//! Mutable collection of transactions believed to be inside the window

use parking_lot::RwLock;
use rust_decimal::Decimal;

use super::Transaction;

/// Concurrent transaction store
///
/// Inserts and evictions take the write lock; the amounts copy handed to the
/// aggregator takes the read lock only for the duration of the copy.
#[derive(Debug, Default)]
pub struct TransactionStore {
    transactions: RwLock<Vec<Transaction>>,
}

impl TransactionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the transaction unconditionally. Callers check the window first.
    pub fn insert(&self, transaction: Transaction) {
        self.transactions.write().push(transaction);
    }

    /// Removes every transaction outside the window ending at `now`.
    ///
    /// Returns the number of evicted transactions.
    pub fn evict_expired(&self, now: i64) -> usize {
        let mut transactions = self.transactions.write();
        let before = transactions.len();
        transactions.retain(|t| t.in_window(now));
        before - transactions.len()
    }

    /// Consistent copy of all retained amounts
    #[must_use]
    pub fn snapshot_amounts(&self) -> Vec<Decimal> {
        self.transactions
            .read()
            .iter()
            .map(Transaction::amount)
            .collect()
    }

    /// Number of transactions currently held
    #[must_use]
    pub fn retained(&self) -> usize {
        self.transactions.read().len()
    }
}
