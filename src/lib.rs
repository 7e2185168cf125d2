#![deny(missing_docs)]

//! Client orchestration core for the FIISplorer academic document search.

/// Environment-driven configuration management.
pub mod config;
/// Page-level state shared by search and upload.
pub mod controller;
/// Structured logging and tracing setup.
pub mod logging;
/// Search and upload activity counters.
pub mod metrics;
/// Search request lifecycle against the document backend.
pub mod search;
/// Upload admission and queue processing.
pub mod upload;
