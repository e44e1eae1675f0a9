//! In-memory usage ledger implementation.
//!
//! Append-only, `Mutex`-guarded. Suitable for development and tests; data
//! does not survive a restart.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::foundation::UserId;
use crate::ports::{StoreError, UsageLedger, UsageRecord};

/// In-memory implementation of the UsageLedger port.
#[derive(Default)]
pub struct InMemoryUsageLedger {
    records: Mutex<Vec<UsageRecord>>,
}

impl InMemoryUsageLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded usage records.
    pub fn records(&self) -> Vec<UsageRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Returns the total number of records.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Returns true if no records exist.
    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl UsageLedger for InMemoryUsageLedger {
    async fn record(&self, record: UsageRecord) -> Result<(), StoreError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    async fn total_cost(&self, user_id: &UserId) -> Result<f64, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| &r.user_id == user_id)
            .map(|r| r.cost)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user: &str, tokens: u32, cost: f64) -> UsageRecord {
        UsageRecord::new(
            UserId::new(user).unwrap(),
            tokens,
            cost,
            "gpt-3.5-turbo",
            "chat",
        )
    }

    #[tokio::test]
    async fn records_accumulate_append_only() {
        let ledger = InMemoryUsageLedger::new();
        assert!(ledger.is_empty());

        ledger.record(record("demo-user", 100, 0.0002)).await.unwrap();
        ledger.record(record("demo-user", 500, 0.001)).await.unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.records()[0].tokens_used, 100);
    }

    #[tokio::test]
    async fn total_cost_sums_per_user() {
        let ledger = InMemoryUsageLedger::new();
        ledger.record(record("alice", 1000, 0.002)).await.unwrap();
        ledger.record(record("alice", 500, 0.001)).await.unwrap();
        ledger.record(record("bob", 1000, 0.002)).await.unwrap();

        let alice = UserId::new("alice").unwrap();
        let total = ledger.total_cost(&alice).await.unwrap();
        assert!((total - 0.003).abs() < 1e-12);
    }
}
