//! UsageLedger port - append-only record of AI token and cost consumption.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::StoreError;

/// Record of AI usage for a single call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// User the call was made for.
    pub user_id: UserId,
    /// Total tokens consumed.
    pub tokens_used: u32,
    /// Derived cost in USD. Never negative.
    pub cost: f64,
    /// Model used.
    pub model: String,
    /// Endpoint tag (e.g. "chat").
    pub endpoint: String,
    /// When the usage occurred.
    pub occurred_at: Timestamp,
}

impl UsageRecord {
    /// Creates a new usage record stamped with the current time.
    pub fn new(
        user_id: UserId,
        tokens_used: u32,
        cost: f64,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            tokens_used,
            cost,
            model: model.into(),
            endpoint: endpoint.into(),
            occurred_at: Timestamp::now(),
        }
    }
}

/// Port for the append-only usage ledger.
///
/// One record is written per AI call; records are never updated or deleted.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Appends a usage record.
    async fn record(&self, record: UsageRecord) -> Result<(), StoreError>;

    /// Total cost accumulated by a user across all records.
    async fn total_cost(&self, user_id: &UserId) -> Result<f64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_record_carries_endpoint_tag() {
        let record = UsageRecord::new(
            UserId::new("demo-user").unwrap(),
            150,
            0.0003,
            "gpt-3.5-turbo",
            "chat",
        );

        assert_eq!(record.tokens_used, 150);
        assert_eq!(record.endpoint, "chat");
        assert!(record.cost >= 0.0);
    }
}
