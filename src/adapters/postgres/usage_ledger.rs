//! PostgreSQL implementation of the usage ledger.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::UserId;
use crate::ports::{StoreError, UsageLedger, UsageRecord};

/// PostgreSQL implementation of the UsageLedger port.
#[derive(Clone)]
pub struct PostgresUsageLedger {
    pool: PgPool,
}

impl PostgresUsageLedger {
    /// Creates a new PostgresUsageLedger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageLedger for PostgresUsageLedger {
    async fn record(&self, record: UsageRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ai_usage (id, user_id, tokens_used, cost, model, endpoint, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.user_id.as_str())
        .bind(record.tokens_used as i64)
        .bind(record.cost)
        .bind(&record.model)
        .bind(&record.endpoint)
        .bind(record.occurred_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to insert usage record: {}", e)))?;

        Ok(())
    }

    async fn total_cost(&self, user_id: &UserId) -> Result<f64, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(cost), 0) AS total
            FROM ai_usage
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to sum usage cost: {}", e)))?;

        row.try_get("total")
            .map_err(|e| StoreError::database(e.to_string()))
    }
}
