//! Search request lifecycle: bounded backend calls, normalization, and ordering.

pub mod client;
pub mod mappers;
mod orchestrator;
pub mod types;

pub use client::{HttpSearchBackend, SearchBackend};
pub use orchestrator::SearchOrchestrator;
pub use types::{
    DateRange, DocumentSource, RawRecord, SearchError, SearchFailureKind, SearchFilters,
    SearchOutcome, SearchResultItem,
};
