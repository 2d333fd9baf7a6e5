use std::sync::Arc;

use crate::errors::{LogServiceError, LogServiceResult};
use crate::log_record::LogRecordResponse;
use crate::log_store::LogStore;

/// Fixed page size of the read-recent query. No continuation is offered.
pub const RECENT_LIMIT: usize = 100;

/// Read-recent handler: one indexed query per call, no caching.
pub struct ReadRecentHandler {
    store: Arc<dyn LogStore>,
    index_name: String,
    partition_key: String,
}

impl ReadRecentHandler {
    pub fn new(
        store: Arc<dyn LogStore>,
        index_name: impl Into<String>,
        partition_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            index_name: index_name.into(),
            partition_key: partition_key.into(),
        }
    }

    /// Up to [`RECENT_LIMIT`] records, newest first, partition key stripped.
    pub fn handle(&self) -> LogServiceResult<Vec<LogRecordResponse>> {
        let records = self
            .store
            .query_recent(&self.index_name, &self.partition_key, RECENT_LIMIT)
            .map_err(|e| LogServiceError::store("query", e))?;

        tracing::debug!(count = records.len(), "read recent logs");
        Ok(records.into_iter().map(LogRecordResponse::from).collect())
    }
}
