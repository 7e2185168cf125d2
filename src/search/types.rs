//! Core data types and error definitions for the search pipeline.

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use time::Date;

/// Banner shown when the user submits a blank query.
pub const EMPTY_QUERY_MESSAGE: &str = "Por favor ingresa un término de búsqueda";
/// Banner shown when a search exceeds the timeout bound.
pub const TIMEOUT_MESSAGE: &str =
    "La búsqueda tardó demasiado. Por favor, intenta con términos más específicos.";
/// Banner shown for status and connectivity failures.
pub const BACKEND_MESSAGE: &str =
    "Error al conectar con el servidor de búsqueda. Por favor, intenta nuevamente.";

/// Optional inclusive date boundaries collected by the filter panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Earliest modification date (inclusive).
    pub from: Option<Date>,
    /// Latest modification date (inclusive).
    pub to: Option<Date>,
}

impl DateRange {
    /// Whether either boundary was supplied.
    pub fn is_set(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }
}

/// Structured filters accompanying a free-text query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Document type such as `pdf` or `docx`; empty means any type.
    pub file_type: String,
    /// Date boundaries; collected but not sent to the backend.
    pub date_range: DateRange,
}

impl SearchFilters {
    /// Filter restricting results to a single document type.
    pub fn with_file_type(file_type: impl Into<String>) -> Self {
        Self {
            file_type: file_type.into(),
            ..Self::default()
        }
    }

    /// Normalized file type filter, `None` when any type is accepted.
    pub fn file_type(&self) -> Option<String> {
        let trimmed = self.file_type.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    }
}

/// Loosely-typed record returned by the backend; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// Document title.
    pub title: Option<String>,
    /// Document type as reported by the indexer (`PDF`, `docx`, ...).
    pub doc_type: Option<String>,
    /// File weight in megabytes.
    pub weight: Option<f64>,
    /// Human-readable modification date.
    pub date: Option<String>,
    /// Matched text excerpt.
    pub text_result: Option<String>,
    /// Relative path or absolute URL of the document.
    pub url: Option<String>,
    /// Relevance score used for ordering.
    pub score: Option<f64>,
}

impl RawRecord {
    /// Extract a record from a JSON object, tolerating missing or mistyped fields.
    pub fn from_object(map: &Map<String, Value>) -> Self {
        Self {
            title: string_field(map, "title"),
            doc_type: string_field(map, "doc_type"),
            weight: number_field(map, "weight"),
            date: string_field(map, "date"),
            text_result: string_field(map, "text_result"),
            url: string_field(map, "url"),
            score: number_field(map, "score"),
        }
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(value)) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}

fn number_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    match map.get(key) {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(value)) => value.trim().parse().ok(),
        _ => None,
    }
}

/// Where a rendered document came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    /// Returned by the search backend.
    #[default]
    Backend,
    /// Added locally through the upload dialog.
    Uploaded,
}

/// Normalized document entry rendered by the results list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    /// Identifier unique within the rendered collection.
    pub id: String,
    /// Document title.
    pub title: String,
    /// Lowercase document type.
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Display size, e.g. `2.3 MB`.
    pub size: String,
    /// Display modification date.
    pub last_modified: String,
    /// Excerpt or description.
    pub content: String,
    /// Absolute URL (or `#` when unavailable).
    pub url: String,
    /// Ordering score, higher first.
    pub score: f64,
    /// Origin of the entry.
    pub source: DocumentSource,
}

impl SearchResultItem {
    /// Whether the entry was added through the upload dialog.
    pub fn is_uploaded(&self) -> bool {
        self.source == DocumentSource::Uploaded
    }
}

/// User-facing classification of a failed search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFailureKind {
    /// Blank input; never reached the backend.
    EmptyQuery,
    /// The request exceeded the timeout bound and was cancelled.
    Timeout,
    /// Non-success status or connectivity failure.
    Backend,
}

impl SearchFailureKind {
    /// Fixed banner text for this failure class.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::EmptyQuery => EMPTY_QUERY_MESSAGE,
            Self::Timeout => TIMEOUT_MESSAGE,
            Self::Backend => BACKEND_MESSAGE,
        }
    }
}

/// Errors emitted while orchestrating a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query was blank or whitespace-only.
    #[error("search query is empty")]
    EmptyQuery,
    /// The backend did not answer within the bound.
    #[error("search timed out after {0:?}")]
    Timeout(Duration),
    /// Backend URL failed to parse or normalize.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before a complete response was read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Backend responded with a non-success status code.
    #[error("Unexpected backend response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the backend.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Response body was not the expected JSON array.
    #[error("Unexpected backend payload: {0}")]
    Decode(String),
}

impl SearchError {
    /// Collapse the error into the class used for user messaging.
    pub fn kind(&self) -> SearchFailureKind {
        match self {
            Self::EmptyQuery => SearchFailureKind::EmptyQuery,
            Self::Timeout(_) => SearchFailureKind::Timeout,
            Self::Http(err) if err.is_timeout() => SearchFailureKind::Timeout,
            _ => SearchFailureKind::Backend,
        }
    }

    /// Banner text for this error.
    pub fn user_message(&self) -> &'static str {
        self.kind().user_message()
    }
}

/// Result of one search invocation, tagged with its issue order.
#[derive(Debug)]
pub struct SearchOutcome {
    /// Sequence number assigned when the search was issued.
    pub sequence: u64,
    /// Ordered results; empty whenever `error` is set.
    pub results: Vec<SearchResultItem>,
    /// Failure surfaced to the caller instead of being raised.
    pub error: Option<SearchError>,
}

impl SearchOutcome {
    /// Whether the invocation produced a result set (possibly empty).
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_record_tolerates_missing_and_mistyped_fields() {
        let value = json!({
            "title": "  ",
            "doc_type": "PDF",
            "weight": "2.5",
            "score": 0.8,
            "url": null,
            "text_result": ["not", "a", "string"]
        });
        let record = RawRecord::from_object(value.as_object().unwrap());
        assert_eq!(record.title, None);
        assert_eq!(record.doc_type.as_deref(), Some("PDF"));
        assert_eq!(record.weight, Some(2.5));
        assert_eq!(record.score, Some(0.8));
        assert_eq!(record.url, None);
        assert_eq!(record.text_result, None);
        assert_eq!(record.date, None);
    }

    #[test]
    fn file_type_filter_normalizes_input() {
        assert_eq!(SearchFilters::default().file_type(), None);
        assert_eq!(SearchFilters::with_file_type("   ").file_type(), None);
        assert_eq!(
            SearchFilters::with_file_type(".PDF").file_type().as_deref(),
            Some("pdf")
        );
    }

    #[test]
    fn errors_collapse_into_user_facing_kinds() {
        assert_eq!(SearchError::EmptyQuery.kind(), SearchFailureKind::EmptyQuery);
        assert_eq!(
            SearchError::Timeout(Duration::from_secs(8)).kind(),
            SearchFailureKind::Timeout
        );
        let status = SearchError::UnexpectedStatus {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert_eq!(status.kind(), SearchFailureKind::Backend);
        assert_eq!(status.user_message(), BACKEND_MESSAGE);
        assert_eq!(
            SearchError::Decode("object".into()).user_message(),
            BACKEND_MESSAGE
        );
    }

    #[test]
    fn result_item_serializes_with_frontend_field_names() {
        let item = SearchResultItem {
            id: "doc-1-0".into(),
            title: "Reglamento".into(),
            doc_type: "pdf".into(),
            size: "1.0 MB".into(),
            last_modified: "2024-03-15".into(),
            content: "texto".into(),
            url: "#".into(),
            score: 0.5,
            source: DocumentSource::Backend,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "pdf");
        assert_eq!(value["lastModified"], "2024-03-15");
        assert_eq!(value["source"], "backend");
        assert!(!item.is_uploaded());
    }
}
