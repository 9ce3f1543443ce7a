//! Transaction entity

use rust_decimal::Decimal;
use services_common::STATISTICS_WINDOW_MS;

/// An immutable amount observed at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    amount: Decimal,
    /// Milliseconds since the Unix epoch
    timestamp: i64,
}

impl Transaction {
    #[must_use]
    pub const fn new(amount: Decimal, timestamp: i64) -> Self {
        Self { amount, timestamp }
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Age of the transaction relative to `now`, `None` if not representable
    #[must_use]
    pub const fn age_millis(&self, now: i64) -> Option<i64> {
        now.checked_sub(self.timestamp)
    }

    /// True iff `0 <= now - timestamp < 60000`.
    ///
    /// Future-dated transactions are outside the window.
    #[must_use]
    pub fn in_window(&self, now: i64) -> bool {
        self.age_millis(now)
            .is_some_and(|age| (0..STATISTICS_WINDOW_MS).contains(&age))
    }
}
