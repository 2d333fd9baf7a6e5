//! Library root for the `log_service` crate

// Core error handling
pub mod errors;

// Configuration & CLI
pub mod cli;
pub mod config;

// Data model and storage
pub mod log_record;
pub mod log_store;
pub mod log_store_sled;

// Request handlers
pub mod ingest;
pub mod read_recent;

// Web server interface
pub mod web;

pub use errors::{LogServiceError, LogServiceResult};
pub use log_record::{LogRecord, LogRecordResponse, Severity};
pub use log_store::LogStore;
