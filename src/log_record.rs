//! Log record data model shared by the ingest and read-recent paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::LogServiceError;

/// Severity of an ingested record. Input is case-insensitive, storage is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl FromStr for Severity {
    type Err = LogServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(LogServiceError::InvalidSeverity {
                severity: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted log record. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: String,
    pub severity: Severity,
    pub message: String,
    pub date_time: DateTime<Utc>,
    pub partition_key: String,
}

impl LogRecord {
    /// Builds a record with a fresh random id stamped with the current time
    pub fn new(severity: Severity, message: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            severity,
            message: message.into(),
            date_time: Utc::now(),
            partition_key: partition_key.into(),
        }
    }
}

/// Caller-facing projection of [`LogRecord`] without the partition key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecordResponse {
    pub id: String,
    pub severity: Severity,
    pub message: String,
    pub date_time: DateTime<Utc>,
}

impl From<LogRecord> for LogRecordResponse {
    fn from(record: LogRecord) -> Self {
        Self {
            id: record.id,
            severity: record.severity,
            message: record.message,
            date_time: record.date_time,
        }
    }
}
