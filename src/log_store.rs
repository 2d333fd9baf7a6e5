use crate::log_record::LogRecord;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transaction aborted: {0}")]
    Transaction(String),

    #[error("Index '{0}' does not exist")]
    UnknownIndex(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Backing collection for log records, keyed by record id with one
/// secondary index over the partition key in write order.
pub trait LogStore: Send + Sync {
    /// Unconditional single-item put. Overwrites an existing record with the same id.
    fn put(&self, record: &LogRecord) -> StoreResult<()>;

    /// Newest-first records under `partition_key` in `index_name`, at most `limit`.
    fn query_recent(
        &self,
        index_name: &str,
        partition_key: &str,
        limit: usize,
    ) -> StoreResult<Vec<LogRecord>>;
}
