//! Admission rules deciding which candidate files may enter the upload queue.

use super::types::{AdmissionError, FileBlob};
use std::path::Path;

/// Word document (`.docx`).
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// Excel workbook (`.xlsx`).
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Plain text (`.txt`).
pub const MIME_TXT: &str = "text/plain";
/// PDF document (`.pdf`).
pub const MIME_PDF: &str = "application/pdf";
/// Reported for files whose extension is not recognised.
pub const MIME_UNKNOWN: &str = "application/octet-stream";

/// MIME types accepted by the upload dialog.
pub const ACCEPTED_MIME_TYPES: [&str; 4] = [MIME_DOCX, MIME_XLSX, MIME_TXT, MIME_PDF];
/// Extensions offered by the file picker, mirroring [`ACCEPTED_MIME_TYPES`].
pub const ACCEPTED_EXTENSIONS: [&str; 4] = [".docx", ".xlsx", ".txt", ".pdf"];

/// Whether `mime_type` is in the allow-list.
pub fn is_accepted_mime(mime_type: &str) -> bool {
    ACCEPTED_MIME_TYPES.contains(&mime_type.trim())
}

/// MIME type associated with a picker extension (with or without the leading dot).
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    let normalized = extension.trim().trim_start_matches('.').to_lowercase();
    match normalized.as_str() {
        "docx" => Some(MIME_DOCX),
        "xlsx" => Some(MIME_XLSX),
        "txt" => Some(MIME_TXT),
        "pdf" => Some(MIME_PDF),
        _ => None,
    }
}

/// MIME type for a path on disk, falling back to [`MIME_UNKNOWN`].
pub fn mime_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_for_extension)
        .unwrap_or(MIME_UNKNOWN)
}

/// Evaluate every admission rule for one file.
///
/// Rules are independent: a file with a disallowed type that is also too large yields both
/// rejections, type first.
pub fn validate(file: &FileBlob, max_bytes: u64) -> Vec<AdmissionError> {
    let mut violations = Vec::new();
    if !is_accepted_mime(&file.mime_type) {
        violations.push(AdmissionError::InvalidType {
            file_name: file.name.clone(),
            mime_type: file.mime_type.clone(),
        });
    }
    if file.size > max_bytes {
        violations.push(AdmissionError::TooLarge {
            file_name: file.name.clone(),
            size: file.size,
            limit: max_bytes,
        });
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    const LIMIT: u64 = 10 * 1024 * 1024;

    fn blob(name: &str, mime: &str, size: usize) -> FileBlob {
        FileBlob::from_bytes(name, mime, Bytes::from(vec![0_u8; size]))
    }

    #[test]
    fn accepts_allowed_types_within_limit() {
        for mime in ACCEPTED_MIME_TYPES {
            assert!(validate(&blob("doc", mime, 16), LIMIT).is_empty());
        }
        assert!(validate(&blob("limite.pdf", MIME_PDF, LIMIT as usize), LIMIT).is_empty());
    }

    #[test]
    fn rejects_disallowed_type() {
        let violations = validate(&blob("foto.png", "image/png", 16), LIMIT);
        assert_eq!(
            violations,
            vec![AdmissionError::InvalidType {
                file_name: "foto.png".into(),
                mime_type: "image/png".into(),
            }]
        );
    }

    #[test]
    fn rejects_oversized_file_regardless_of_type() {
        let oversized = LIMIT as usize + 1;
        let valid_type = validate(&blob("tesis.pdf", MIME_PDF, oversized), LIMIT);
        assert!(matches!(
            valid_type.as_slice(),
            [AdmissionError::TooLarge { file_name, .. }] if file_name == "tesis.pdf"
        ));

        let invalid_type = validate(&blob("video.mp4", "video/mp4", oversized), LIMIT);
        assert_eq!(invalid_type.len(), 2);
        assert!(matches!(invalid_type[0], AdmissionError::InvalidType { .. }));
        assert!(matches!(invalid_type[1], AdmissionError::TooLarge { .. }));
    }

    #[test]
    fn picker_extensions_mirror_mime_allow_list() {
        for extension in ACCEPTED_EXTENSIONS {
            let mime = mime_for_extension(extension).expect("known extension");
            assert!(is_accepted_mime(mime));
        }
        assert_eq!(mime_for_extension("PDF"), Some(MIME_PDF));
        assert_eq!(mime_for_extension(".doc"), None);
        assert_eq!(mime_for_path(Path::new("notas.XLSX")), MIME_XLSX);
        assert_eq!(mime_for_path(Path::new("LEEME")), MIME_UNKNOWN);
    }
}
