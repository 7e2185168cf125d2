//! HTTP client wrapper for the document search backend.

use crate::search::types::{RawRecord, SearchError};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

/// Interface implemented by search backends.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a free-text query and return the raw records in backend order.
    async fn fetch(&self, query: &str) -> Result<Vec<RawRecord>, SearchError>;
}

/// Lightweight HTTP client for `GET /search?q=...`.
pub struct HttpSearchBackend {
    pub(crate) client: Client,
    pub(crate) endpoint: Url,
}

impl HttpSearchBackend {
    /// Construct a client targeting `<backend_url>/search`.
    pub fn new(backend_url: &Url) -> Result<Self, SearchError> {
        let client = Client::builder().user_agent("fiisplorer/0.2").build()?;
        let endpoint = endpoint_url(backend_url, "search")?;
        tracing::debug!(endpoint = %endpoint, "Initialized search HTTP client");
        Ok(Self { client, endpoint })
    }

    /// Endpoint receiving search requests.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn fetch(&self, query: &str) -> Result<Vec<RawRecord>, SearchError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("q", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = SearchError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Search backend request failed");
            return Err(error);
        }

        let payload: Value = response.json().await?;
        parse_records(payload)
    }
}

/// Decode the backend payload, skipping entries that are not JSON objects.
pub(crate) fn parse_records(payload: Value) -> Result<Vec<RawRecord>, SearchError> {
    let Value::Array(entries) = payload else {
        return Err(SearchError::Decode(format!(
            "expected a JSON array, got {}",
            json_kind(&payload)
        )));
    };

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match entry {
            Value::Object(map) => records.push(RawRecord::from_object(&map)),
            other => {
                tracing::warn!(
                    index,
                    kind = json_kind(&other),
                    "Skipping malformed search record"
                );
            }
        }
    }
    Ok(records)
}

/// Resolve `<base>/<path>` while preserving any path prefix on the base URL.
pub(crate) fn endpoint_url(base: &Url, path: &str) -> Result<Url, SearchError> {
    let base = normalize_base_url(base.as_str()).map_err(SearchError::InvalidUrl)?;
    let joined = format_endpoint(&base, path);
    Url::parse(&joined).map_err(|err| SearchError::InvalidUrl(err.to_string()))
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    parsed.set_query(None);
    parsed.set_fragment(None);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    fn backend_for(server: &MockServer) -> HttpSearchBackend {
        HttpSearchBackend {
            client: Client::builder()
                .user_agent("fiisplorer-test")
                .build()
                .expect("client"),
            endpoint: Url::parse(&server.url("/search")).expect("endpoint"),
        }
    }

    #[tokio::test]
    async fn fetch_emits_encoded_query_and_decodes_records() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search")
                    .query_param("q", "reglamento académico");
                then.status(200).json_body(json!([
                    {
                        "title": "Reglamento",
                        "doc_type": "PDF",
                        "weight": 1.25,
                        "date": "2024-03-15",
                        "text_result": "Artículo 1",
                        "url": "docs\\reglamento.pdf",
                        "score": 0.9
                    },
                    "garbage",
                    {}
                ]));
            })
            .await;

        let records = backend_for(&server)
            .fetch("reglamento académico")
            .await
            .expect("search request");

        mock.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title.as_deref(), Some("Reglamento"));
        assert_eq!(records[0].score, Some(0.9));
        assert_eq!(records[1], RawRecord::default());
    }

    #[tokio::test]
    async fn fetch_surfaces_non_success_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(500).body("boom");
            })
            .await;

        let error = backend_for(&server).fetch("tesis").await.unwrap_err();
        match error {
            SearchError::UnexpectedStatus { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_records_rejects_non_array_payloads() {
        let error = parse_records(json!({ "results": [] })).unwrap_err();
        assert!(matches!(error, SearchError::Decode(_)));
    }

    #[test]
    fn endpoint_url_preserves_base_path() {
        let base = Url::parse("http://host:8000/api/").unwrap();
        assert_eq!(
            endpoint_url(&base, "search").unwrap().as_str(),
            "http://host:8000/api/search"
        );
        let root = Url::parse("http://127.0.0.1:8000").unwrap();
        assert_eq!(
            endpoint_url(&root, "/search").unwrap().as_str(),
            "http://127.0.0.1:8000/search"
        );
    }
}
