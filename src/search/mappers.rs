//! Mapping helpers turning raw backend records into rendered result items.

use crate::search::types::{DocumentSource, RawRecord, SearchResultItem};
use reqwest::Url;

/// Title used when the backend omits one.
pub const UNTITLED_DOCUMENT: &str = "Documento sin título";
/// Type assumed when the backend omits `doc_type`.
pub const FALLBACK_DOC_TYPE: &str = "pdf";
/// Size label used when the weight is missing.
pub const UNKNOWN_SIZE: &str = "Tamaño desconocido";
/// Date label used when the backend omits one.
pub const UNKNOWN_DATE: &str = "Fecha desconocida";
/// Content label used when no excerpt is returned.
pub const MISSING_CONTENT: &str = "Contenido no disponible";
/// URL used when a document location cannot be resolved.
pub const FALLBACK_URL: &str = "#";

/// Map a raw backend record into a result item.
///
/// `documents_base` is the `/documents` location on the backend host; relative paths are
/// rewritten to point there.
pub(crate) fn map_record(id: String, record: RawRecord, documents_base: &Url) -> SearchResultItem {
    let RawRecord {
        title,
        doc_type,
        weight,
        date,
        text_result,
        url,
        score,
    } = record;

    SearchResultItem {
        id,
        title: title.unwrap_or_else(|| UNTITLED_DOCUMENT.to_string()),
        doc_type: doc_type
            .map(|value| value.to_lowercase())
            .unwrap_or_else(|| FALLBACK_DOC_TYPE.to_string()),
        size: format_weight(weight),
        last_modified: date.unwrap_or_else(|| UNKNOWN_DATE.to_string()),
        content: text_result.unwrap_or_else(|| MISSING_CONTENT.to_string()),
        url: resolve_document_url(url.as_deref(), documents_base),
        score: score.filter(|value| value.is_finite()).unwrap_or(0.0),
        source: DocumentSource::Backend,
    }
}

fn format_weight(weight: Option<f64>) -> String {
    match weight {
        Some(value) if value.is_finite() && value > 0.0 => format!("{value:.1} MB"),
        _ => UNKNOWN_SIZE.to_string(),
    }
}

/// Resolve a backend document location into an absolute URL.
///
/// Absolute URLs pass through untouched. Anything else is treated as a filesystem path whose
/// file name is served from `documents_base`.
pub fn resolve_document_url(raw: Option<&str>, documents_base: &Url) -> String {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return FALLBACK_URL.to_string();
    };

    if is_absolute_url(raw) {
        return raw.to_string();
    }

    let normalized = raw.replace('\\', "/");
    let Some(file_name) = normalized
        .rsplit('/')
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
    else {
        tracing::debug!(url = raw, "Document path has no file name");
        return FALLBACK_URL.to_string();
    };

    let mut resolved = documents_base.clone();
    match resolved.path_segments_mut() {
        Ok(mut segments) => {
            segments.pop_if_empty().push(file_name);
        }
        Err(()) => return FALLBACK_URL.to_string(),
    }
    resolved.to_string()
}

// Single-letter schemes are Windows drive prefixes such as `C:\docs\file.pdf`.
fn is_absolute_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| url.scheme().len() > 1)
        .unwrap_or(false)
}

/// Sort by score descending; equal scores keep their input order.
pub(crate) fn sort_by_score(items: &mut [SearchResultItem]) {
    items.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Keep only items whose type matches the (already normalized) filter.
pub(crate) fn retain_file_type(items: &mut Vec<SearchResultItem>, file_type: &str) {
    items.retain(|item| item.doc_type == file_type);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documents_base() -> Url {
        Url::parse("http://127.0.0.1:8000/documents").unwrap()
    }

    fn item(id: &str, score: f64) -> SearchResultItem {
        map_record(
            id.to_string(),
            RawRecord {
                score: Some(score),
                ..RawRecord::default()
            },
            &documents_base(),
        )
    }

    #[test]
    fn map_record_applies_defaults_for_missing_fields() {
        let mapped = map_record("doc-1-0".into(), RawRecord::default(), &documents_base());
        assert_eq!(mapped.title, UNTITLED_DOCUMENT);
        assert_eq!(mapped.doc_type, FALLBACK_DOC_TYPE);
        assert_eq!(mapped.size, UNKNOWN_SIZE);
        assert_eq!(mapped.last_modified, UNKNOWN_DATE);
        assert_eq!(mapped.content, MISSING_CONTENT);
        assert_eq!(mapped.url, FALLBACK_URL);
        assert_eq!(mapped.score, 0.0);
        assert_eq!(mapped.source, DocumentSource::Backend);
    }

    #[test]
    fn map_record_formats_present_fields() {
        let record = RawRecord {
            title: Some("Plan de Estudios".into()),
            doc_type: Some("DOCX".into()),
            weight: Some(3.14159),
            date: Some("12 de diciembre, 2023".into()),
            text_result: Some("Materias electivas".into()),
            url: Some("https://www.w3.org/dummy.pdf".into()),
            score: Some(0.75),
        };
        let mapped = map_record("doc-2-0".into(), record, &documents_base());
        assert_eq!(mapped.title, "Plan de Estudios");
        assert_eq!(mapped.doc_type, "docx");
        assert_eq!(mapped.size, "3.1 MB");
        assert_eq!(mapped.last_modified, "12 de diciembre, 2023");
        assert_eq!(mapped.url, "https://www.w3.org/dummy.pdf");
        assert_eq!(mapped.score, 0.75);
    }

    #[test]
    fn zero_weight_is_reported_as_unknown() {
        assert_eq!(format_weight(Some(0.0)), UNKNOWN_SIZE);
        assert_eq!(format_weight(Some(0.04)), "0.0 MB");
    }

    #[test]
    fn resolve_document_url_rewrites_windows_paths() {
        let base = documents_base();
        assert_eq!(
            resolve_document_url(Some("C:\\corpus\\2024\\reglamento.pdf"), &base),
            "http://127.0.0.1:8000/documents/reglamento.pdf"
        );
        assert_eq!(
            resolve_document_url(Some("data/horarios 2024.xlsx"), &base),
            "http://127.0.0.1:8000/documents/horarios%202024.xlsx"
        );
    }

    #[test]
    fn resolve_document_url_falls_back_for_unusable_input() {
        let base = documents_base();
        assert_eq!(resolve_document_url(None, &base), FALLBACK_URL);
        assert_eq!(resolve_document_url(Some("   "), &base), FALLBACK_URL);
        assert_eq!(resolve_document_url(Some("corpus\\"), &base), FALLBACK_URL);
    }

    #[test]
    fn sort_by_score_is_descending_and_stable() {
        let mut items = vec![
            item("a", 0.5),
            item("b", 0.9),
            item("c", 0.5),
            item("d", 0.7),
            item("e", 0.5),
        ];
        sort_by_score(&mut items);
        let ids: Vec<_> = items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c", "e"]);
    }

    #[test]
    fn retain_file_type_filters_by_type() {
        let mut items = vec![item("a", 0.1), item("b", 0.2)];
        items[1].doc_type = "docx".into();
        retain_file_type(&mut items, "docx");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "b");
    }
}
