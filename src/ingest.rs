//! Ingest path: validate a request body, stamp a new record, persist it.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::errors::{LogServiceError, LogServiceResult};
use crate::log_record::{LogRecord, Severity};
use crate::log_store::LogStore;

/// Body returned to the caller after a successful ingest
pub const INGEST_CONFIRMATION: &str = "Log ingested";

/// Shape of an ingest request. `null` and absent fields are equivalent;
/// any other field is ignored.
#[derive(Debug, Default, Deserialize)]
struct IngestRequest {
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// A request that passed validation, severity already normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEntry {
    pub severity: Severity,
    pub message: String,
}

/// Runs the validation sequence over a raw request body.
///
/// Order matters: empty body, then JSON shape, then required fields, then
/// the severity enumeration. The first failure wins.
pub fn validate_body(body: &[u8]) -> LogServiceResult<ValidatedEntry> {
    if body.is_empty() {
        return Err(LogServiceError::MissingBody);
    }

    // Only a JSON object or null is accepted, never an array.
    let request = serde_json::from_slice::<Option<Map<String, Value>>>(body)
        .and_then(|object| match object {
            Some(object) => serde_json::from_value::<IngestRequest>(Value::Object(object)),
            None => Ok(IngestRequest::default()),
        })
        .map_err(|source| LogServiceError::MalformedInput { source })?;

    let (severity, message) = match (request.severity, request.message) {
        (Some(severity), Some(message)) if !severity.is_empty() && !message.is_empty() => {
            (severity, message)
        }
        _ => return Err(LogServiceError::MissingRequiredField),
    };

    Ok(ValidatedEntry {
        severity: severity.parse()?,
        message,
    })
}

/// Ingest handler. Holds the shared store handle and the fixed partition value.
pub struct IngestHandler {
    store: Arc<dyn LogStore>,
    partition_key: String,
}

impl IngestHandler {
    pub fn new(store: Arc<dyn LogStore>, partition_key: impl Into<String>) -> Self {
        Self {
            store,
            partition_key: partition_key.into(),
        }
    }

    /// Validates `body` and writes exactly one record. Store failures are not retried.
    pub fn handle(&self, body: &[u8]) -> LogServiceResult<LogRecord> {
        let entry = validate_body(body)?;
        let record = LogRecord::new(entry.severity, entry.message, self.partition_key.as_str());

        self.store
            .put(&record)
            .map_err(|e| LogServiceError::store("put", e))?;

        tracing::info!(id = %record.id, severity = %record.severity, "log ingested");
        Ok(record)
    }
}
