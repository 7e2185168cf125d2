//! Page-level state: the single rendered result collection and the actions that change it.
//!
//! Searches replace the collection wholesale, completed uploads are prepended to it, and
//! clearing resets it to the "no active query" state. Outcomes of searches that were superseded
//! while in flight are discarded.

use crate::{
    config::Config,
    metrics::{ClientMetrics, MetricsSnapshot},
    search::{
        DocumentSource, SearchError, SearchFailureKind, SearchFilters, SearchOrchestrator,
        SearchResultItem, types::EMPTY_QUERY_MESSAGE,
    },
    upload::{AdmissionReport, FileBlob, UploadCandidate, UploadError, UploadPipeline},
};
use reqwest::Url;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::{Date, Month, OffsetDateTime};

/// Score assigned to uploaded documents so they sort ahead of backend results.
pub const UPLOADED_SCORE: f64 = f64::MAX;

/// What the results area is currently showing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewStatus {
    /// No active query.
    #[default]
    Idle,
    /// A search is in flight.
    Loading,
    /// The user submitted a blank query.
    InputRequired,
    /// The last search failed; results are empty.
    Failed {
        /// Failure class.
        kind: SearchFailureKind,
        /// Banner text.
        message: String,
    },
    /// Results are available (possibly none).
    Ready,
}

impl ViewStatus {
    /// Banner text to render, if any.
    pub fn banner(&self) -> Option<&str> {
        match self {
            Self::InputRequired => Some(EMPTY_QUERY_MESSAGE),
            Self::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Render-ready copy of the page state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageSnapshot {
    /// Query of the most recent search.
    pub query: String,
    /// Current view status.
    pub status: ViewStatus,
    /// Rendered collection, in display order.
    pub results: Vec<SearchResultItem>,
}

/// Wires user actions to the search orchestrator and the upload pipeline.
pub struct PageController {
    search: SearchOrchestrator,
    uploads: UploadPipeline,
    state: Mutex<PageSnapshot>,
    metrics: Arc<ClientMetrics>,
}

impl PageController {
    /// Assemble a controller from its two pipelines.
    pub fn new(search: SearchOrchestrator, uploads: UploadPipeline) -> Self {
        Self {
            search,
            uploads,
            state: Mutex::new(PageSnapshot::default()),
            metrics: Arc::new(ClientMetrics::new()),
        }
    }

    /// Build a controller backed by the HTTP search backend and the simulated upload transport.
    pub fn from_config(config: &Config) -> Result<Self, SearchError> {
        let search = SearchOrchestrator::new(&config.search_settings())?;
        let uploads = UploadPipeline::new(config.upload_settings());
        Ok(Self::new(search, uploads))
    }

    /// Current page state.
    pub fn snapshot(&self) -> PageSnapshot {
        self.lock_state().clone()
    }

    /// The upload pipeline, for subscribing to events and inspecting the queue.
    pub fn uploads(&self) -> &UploadPipeline {
        &self.uploads
    }

    /// Current activity counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Run a search and, unless a newer search superseded it, replace the rendered collection.
    pub async fn search(&self, query: &str, filters: &SearchFilters) -> PageSnapshot {
        self.metrics.record_search_issued();
        {
            let mut state = self.lock_state();
            state.query = query.trim().to_string();
            state.status = ViewStatus::Loading;
        }

        let outcome = self.search.search(query, filters).await;

        let mut state = self.lock_state();
        if !self.search.is_latest(outcome.sequence) {
            self.metrics.record_stale_discarded();
            tracing::warn!(
                sequence = outcome.sequence,
                latest = self.search.latest_sequence(),
                "Discarding superseded search outcome"
            );
            return state.clone();
        }

        match outcome.error {
            None => {
                self.metrics.record_search_succeeded();
                state.results = outcome.results;
                state.status = ViewStatus::Ready;
            }
            Some(error) => {
                state.results.clear();
                state.status = match error.kind() {
                    SearchFailureKind::EmptyQuery => ViewStatus::InputRequired,
                    kind => {
                        if kind == SearchFailureKind::Timeout {
                            self.metrics.record_search_timeout();
                        } else {
                            self.metrics.record_search_failure();
                        }
                        ViewStatus::Failed {
                            kind,
                            message: kind.user_message().to_string(),
                        }
                    }
                };
            }
        }
        state.clone()
    }

    /// Reset to the "no active query" state and supersede any in-flight search.
    pub fn clear(&self) -> PageSnapshot {
        self.search.invalidate();
        let mut state = self.lock_state();
        *state = PageSnapshot::default();
        tracing::debug!("Cleared search state");
        state.clone()
    }

    /// Validate files and queue the admitted ones for upload.
    pub fn admit_files(&self, files: Vec<FileBlob>) -> AdmissionReport {
        let report = self.uploads.admit(files);
        self.record_admission(&report);
        report
    }

    /// Queue files from disk; oversized or disallowed files are rejected before being read.
    pub async fn admit_paths(&self, paths: &[PathBuf]) -> AdmissionReport {
        let report = self.uploads.admit_paths(paths).await;
        self.record_admission(&report);
        report
    }

    fn record_admission(&self, report: &AdmissionReport) {
        self.metrics
            .record_admission(report.admitted.len() as u64, report.rejected.len() as u64);
    }

    /// Remove a queued file that has not started uploading.
    pub fn remove_upload(&self, id: &str) -> Result<UploadCandidate, UploadError> {
        self.uploads.remove(id)
    }

    /// Process the upload queue and adopt the files that were uploaded.
    pub async fn upload(&self) -> Result<PageSnapshot, UploadError> {
        let files = self.uploads.process_queue().await?;
        Ok(self.adopt_uploads(files))
    }

    /// Prepend uploaded files to the rendered collection, keeping existing results.
    pub fn adopt_uploads(&self, files: Vec<FileBlob>) -> PageSnapshot {
        if files.is_empty() {
            return self.snapshot();
        }

        let today = OffsetDateTime::now_utc().date();
        let mut merged: Vec<SearchResultItem> =
            files.iter().map(|file| uploaded_item(file, today)).collect();
        let count = merged.len();

        let mut state = self.lock_state();
        merged.append(&mut state.results);
        state.results = merged;
        state.status = ViewStatus::Ready;
        self.metrics.record_uploaded(count as u64);
        tracing::info!(files = count, "Added uploaded documents to results");
        state.clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, PageSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn uploaded_item(file: &FileBlob, today: Date) -> SearchResultItem {
    let key = uuid::Uuid::new_v4();
    let url = file
        .path
        .as_deref()
        .and_then(|path| Url::from_file_path(path).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| format!("blob:fiisplorer/{key}"));

    SearchResultItem {
        id: format!("uploaded-{key}"),
        title: file.stem().to_string(),
        doc_type: file.extension().unwrap_or_else(|| "unknown".to_string()),
        size: format!("{:.1} MB", file.size as f64 / 1024.0 / 1024.0),
        last_modified: format_spanish_date(today),
        content: format!(
            "Documento subido: {}. Contenido del archivo subido por el usuario.",
            file.name
        ),
        url,
        score: UPLOADED_SCORE,
        source: DocumentSource::Uploaded,
    }
}

/// Long Spanish date, e.g. `16 de octubre de 2026`.
pub fn format_spanish_date(date: Date) -> String {
    let month = match date.month() {
        Month::January => "enero",
        Month::February => "febrero",
        Month::March => "marzo",
        Month::April => "abril",
        Month::May => "mayo",
        Month::June => "junio",
        Month::July => "julio",
        Month::August => "agosto",
        Month::September => "septiembre",
        Month::October => "octubre",
        Month::November => "noviembre",
        Month::December => "diciembre",
    };
    format!("{} de {} de {}", date.day(), month, date.year())
}
