//! Search request lifecycle: validation, bounded backend call, normalization and ordering.

use crate::{
    config::SearchSettings,
    search::{
        client::{HttpSearchBackend, SearchBackend, endpoint_url},
        mappers::{map_record, retain_file_type, sort_by_score},
        types::{SearchError, SearchFilters, SearchOutcome, SearchResultItem},
    },
};
use reqwest::Url;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Issues queries against the backend and turns the response into an ordered result set.
///
/// Every invocation is tagged with a monotonically increasing sequence number so callers can
/// drop outcomes that were superseded by a newer search while they were in flight.
pub struct SearchOrchestrator {
    backend: Box<dyn SearchBackend>,
    documents_base: Url,
    timeout: Duration,
    issued: AtomicU64,
}

impl SearchOrchestrator {
    /// Build an orchestrator talking to the HTTP backend described by `settings`.
    pub fn new(settings: &SearchSettings) -> Result<Self, SearchError> {
        let backend = HttpSearchBackend::new(&settings.backend_url)?;
        Self::with_backend(Box::new(backend), settings)
    }

    /// Build an orchestrator around an arbitrary backend implementation.
    pub fn with_backend(
        backend: Box<dyn SearchBackend>,
        settings: &SearchSettings,
    ) -> Result<Self, SearchError> {
        let documents_base = endpoint_url(&settings.backend_url, "documents")?;
        Ok(Self {
            backend,
            documents_base,
            timeout: settings.timeout,
            issued: AtomicU64::new(0),
        })
    }

    /// Sequence number of the most recently issued search.
    pub fn latest_sequence(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Whether `sequence` still identifies the newest search.
    pub fn is_latest(&self, sequence: u64) -> bool {
        self.latest_sequence() == sequence
    }

    /// Supersede every in-flight search without issuing a new one.
    pub fn invalidate(&self) -> u64 {
        self.next_sequence()
    }

    /// Run a search and return its outcome; failures are reported, never raised.
    pub async fn search(&self, query: &str, filters: &SearchFilters) -> SearchOutcome {
        let sequence = self.next_sequence();
        match self.run(sequence, query, filters).await {
            Ok(results) => {
                tracing::info!(sequence, results = results.len(), "Search completed");
                SearchOutcome {
                    sequence,
                    results,
                    error: None,
                }
            }
            Err(error) => {
                if matches!(error, SearchError::EmptyQuery) {
                    tracing::debug!(sequence, "Skipping search for blank query");
                } else {
                    tracing::warn!(sequence, kind = ?error.kind(), error = %error, "Search failed");
                }
                SearchOutcome {
                    sequence,
                    results: Vec::new(),
                    error: Some(error),
                }
            }
        }
    }

    async fn run(
        &self,
        sequence: u64,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchResultItem>, SearchError> {
        // Whitespace only decides blankness; the backend receives the query as typed.
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if filters.date_range.is_set() {
            tracing::debug!(
                sequence,
                from = ?filters.date_range.from,
                to = ?filters.date_range.to,
                "Date range filter is not supported by the backend; ignoring"
            );
        }

        tracing::info!(sequence, query, "Issuing search");
        // Dropping the timed-out future aborts the in-flight request.
        let records = tokio::time::timeout(self.timeout, self.backend.fetch(query))
            .await
            .map_err(|_| SearchError::Timeout(self.timeout))??;

        let mut results: Vec<SearchResultItem> = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                map_record(
                    format!("doc-{sequence}-{index}"),
                    record,
                    &self.documents_base,
                )
            })
            .collect();

        if let Some(file_type) = filters.file_type() {
            retain_file_type(&mut results, &file_type);
        }
        sort_by_score(&mut results);
        Ok(results)
    }

    fn next_sequence(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }
}
