//! Statistics snapshot and the aggregator that publishes it

use parking_lot::RwLock;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use services_common::STATISTICS_SCALE;
use thiserror::Error;

/// Failures while recomputing statistics
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatisticsError {
    #[error("sum overflowed after {count} transactions")]
    SumOverflow { count: usize },

    #[error("average of {count} transactions is not representable")]
    AverageOverflow { count: usize },
}

/// Immutable aggregate over the transactions of one sweep
///
/// All decimals are floored to two fractional digits. An empty window yields
/// zero everywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransactionStatistics {
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
    #[serde(rename = "avg", with = "rust_decimal::serde::float")]
    pub average: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub min: Decimal,
    pub count: u64,
}

impl TransactionStatistics {
    /// Computes statistics over `amounts`
    pub fn from_amounts(amounts: &[Decimal]) -> Result<Self, StatisticsError> {
        let Some((&first, rest)) = amounts.split_first() else {
            return Ok(Self::default());
        };

        let count = amounts.len();
        let (mut sum, mut min, mut max) = (first, first, first);
        for &amount in rest {
            sum = sum
                .checked_add(amount)
                .ok_or(StatisticsError::SumOverflow { count })?;
            min = min.min(amount);
            max = max.max(amount);
        }

        let total = count as u64;
        let count_decimal = Decimal::from(total);
        let average = sum
            .checked_div(count_decimal)
            .ok_or(StatisticsError::AverageOverflow { count })?;

        Ok(Self {
            sum: floor(sum),
            average: floor(average),
            max: floor(max),
            min: floor(min),
            count: total,
        })
    }
}

fn floor(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(STATISTICS_SCALE, RoundingStrategy::ToNegativeInfinity)
}

/// Holder of the currently published snapshot
#[derive(Debug, Default)]
pub struct StatisticsAggregator {
    current: RwLock<TransactionStatistics>,
}

impl StatisticsAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure recomputation, see [`TransactionStatistics::from_amounts`]
    pub fn recompute(amounts: &[Decimal]) -> Result<TransactionStatistics, StatisticsError> {
        TransactionStatistics::from_amounts(amounts)
    }

    /// Replaces the visible snapshot as a whole
    pub fn publish(&self, statistics: TransactionStatistics) {
        *self.current.write() = statistics;
    }

    /// Last published snapshot
    #[must_use]
    pub fn current(&self) -> TransactionStatistics {
        *self.current.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn amounts(values: &[&str]) -> Vec<Decimal> {
        values.iter().map(|v| dec(v)).collect()
    }

    #[test]
    fn test_empty_amounts_yield_all_zero() {
        let stats = TransactionStatistics::from_amounts(&[]).unwrap();
        assert_eq!(stats, TransactionStatistics::default());
        assert_eq!(stats.count, 0);
        assert_eq!(stats.min, Decimal::ZERO);
        assert_eq!(stats.max, Decimal::ZERO);
    }

    #[rstest]
    #[case(&["300"], 1, "300", "300", "300", "300")]
    #[case(&["300", "500"], 2, "800", "400", "500", "300")]
    #[case(&["300", "500", "1000"], 3, "1800", "600", "1000", "300")]
    fn test_basic_aggregates(
        #[case] values: &[&str],
        #[case] count: u64,
        #[case] sum: &str,
        #[case] avg: &str,
        #[case] max: &str,
        #[case] min: &str,
    ) {
        let stats = TransactionStatistics::from_amounts(&amounts(values)).unwrap();
        assert_eq!(stats.count, count);
        assert_eq!(stats.sum, dec(sum));
        assert_eq!(stats.average, dec(avg));
        assert_eq!(stats.max, dec(max));
        assert_eq!(stats.min, dec(min));
    }

    #[test]
    fn test_rounding_floors_at_second_decimal() {
        let stats = TransactionStatistics::from_amounts(&amounts(&["1.019", "2.999"])).unwrap();
        assert_eq!(stats.sum, dec("4.01"));
        assert_eq!(stats.average, dec("2.00"));
        assert_eq!(stats.max, dec("2.99"));
        assert_eq!(stats.min, dec("1.01"));
    }

    #[test]
    fn test_rounding_floors_negative_values_away_from_zero() {
        let stats = TransactionStatistics::from_amounts(&amounts(&["-1.011", "-0.001"])).unwrap();
        assert_eq!(stats.min, dec("-1.02"));
        assert_eq!(stats.max, dec("-0.01"));
        assert_eq!(stats.sum, dec("-1.02"));
        assert_eq!(stats.average, dec("-0.51"));
    }

    #[test]
    fn test_average_of_thirds_is_floored() {
        let stats = TransactionStatistics::from_amounts(&amounts(&["1", "1", "2"])).unwrap();
        assert_eq!(stats.average, dec("1.33"));
    }

    #[test]
    fn test_sum_overflow_is_reported() {
        let err = TransactionStatistics::from_amounts(&[Decimal::MAX, Decimal::MAX]).unwrap_err();
        assert_eq!(err, StatisticsError::SumOverflow { count: 2 });
    }

    #[test]
    fn test_publish_replaces_whole_snapshot() {
        let aggregator = StatisticsAggregator::new();
        assert_eq!(aggregator.current(), TransactionStatistics::default());

        let stats = StatisticsAggregator::recompute(&amounts(&["1", "2"])).unwrap();
        aggregator.publish(stats);
        assert_eq!(aggregator.current(), stats);

        aggregator.publish(TransactionStatistics::default());
        assert_eq!(aggregator.current().count, 0);
        assert_eq!(aggregator.current().sum, Decimal::ZERO);
    }

    #[test]
    fn test_serializes_with_wire_field_names() {
        let stats = TransactionStatistics::from_amounts(&amounts(&["300", "500", "1000"])).unwrap();
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "sum": 1800.0,
                "avg": 600.0,
                "max": 1000.0,
                "min": 300.0,
                "count": 3
            })
        );
    }
}
