//! PostgreSQL storage adapters.

mod chat_store;
mod usage_ledger;

pub use chat_store::PostgresChatStore;
pub use usage_ledger::PostgresUsageLedger;
