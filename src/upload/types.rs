//! Data types and error definitions for the upload pipeline.

use bytes::Bytes;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::admission::{mime_for_path, validate};

/// A file selected or dropped by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    /// File name including its extension.
    pub name: String,
    /// MIME type reported for the file.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// File contents.
    pub data: Bytes,
    /// Location on disk when the file was read from the local filesystem.
    pub path: Option<PathBuf>,
}

impl FileBlob {
    /// Wrap in-memory contents.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: data.len() as u64,
            data,
            path: None,
        }
    }

    /// Read a file from disk, inferring its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let mut blob = Self::from_bytes(name, mime_for_path(path), data);
        blob.path = Some(absolute);
        Ok(blob)
    }

    /// Read a file from disk only if its metadata passes the admission rules.
    ///
    /// Name, MIME type and size are checked before any bytes are loaded, so oversized or
    /// disallowed files are never read into memory.
    pub async fn open_admissible(
        path: impl AsRef<Path>,
        max_bytes: u64,
    ) -> Result<Self, LocalFileError> {
        let path = path.as_ref();
        let io_error = |source: std::io::Error| LocalFileError::Io {
            path: path.to_path_buf(),
            source,
        };

        let metadata = tokio::fs::metadata(path).await.map_err(io_error)?;
        if !metadata.is_file() {
            return Err(io_error(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }

        let header = Self {
            name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            mime_type: mime_for_path(path).to_string(),
            size: metadata.len(),
            data: Bytes::new(),
            path: None,
        };
        let violations = validate(&header, max_bytes);
        if !violations.is_empty() {
            return Err(LocalFileError::Rejected(violations));
        }

        Self::from_path(path).await.map_err(io_error)
    }

    /// File name without its final extension.
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(index) if index > 0 => &self.name[..index],
            _ => &self.name,
        }
    }

    /// Lowercase final extension, if any.
    pub fn extension(&self) -> Option<String> {
        match self.name.rfind('.') {
            Some(index) if index + 1 < self.name.len() => {
                Some(self.name[index + 1..].to_lowercase())
            }
            _ => None,
        }
    }
}

/// Lifecycle state of a queued upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Admitted and waiting for the queue processor.
    Pending,
    /// Currently being transferred.
    Uploading,
    /// Transfer finished.
    Success,
    /// Transfer failed.
    Error,
}

impl UploadStatus {
    /// Whether no further transitions will happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

/// An admitted file tracked by the upload queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    /// Identifier unique within the pipeline.
    pub id: String,
    /// The admitted file.
    pub file: FileBlob,
    /// Current lifecycle state.
    pub status: UploadStatus,
    /// Progress percentage, 0 to 100.
    pub progress: u8,
    /// Failure description when `status` is `Error`.
    pub error: Option<String>,
}

impl UploadCandidate {
    pub(crate) fn pending(file: FileBlob) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file,
            status: UploadStatus::Pending,
            progress: 0,
            error: None,
        }
    }
}

/// Per-file rejection produced by the admission rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// MIME type outside the allow-list.
    #[error("{file_name} no es un tipo de archivo permitido.")]
    InvalidType {
        /// Name of the rejected file.
        file_name: String,
        /// MIME type that was reported.
        mime_type: String,
    },
    /// File larger than the size ceiling.
    #[error("{file_name} excede el límite de {}MB.", .limit / (1024 * 1024))]
    TooLarge {
        /// Name of the rejected file.
        file_name: String,
        /// Actual size in bytes.
        size: u64,
        /// Configured ceiling in bytes.
        limit: u64,
    },
}

impl AdmissionError {
    /// Short headline for notifications.
    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidType { .. } => "Tipo de archivo no válido",
            Self::TooLarge { .. } => "Archivo muy grande",
        }
    }

    /// Name of the file the rejection refers to.
    pub fn file_name(&self) -> &str {
        match self {
            Self::InvalidType { file_name, .. } | Self::TooLarge { file_name, .. } => file_name,
        }
    }
}

/// Outcome of one admission pass.
#[derive(Debug, Clone, Default)]
pub struct AdmissionReport {
    /// Candidates appended to the queue, in arrival order.
    pub admitted: Vec<UploadCandidate>,
    /// One entry per violated rule per rejected file.
    pub rejected: Vec<AdmissionError>,
}

/// Why a local path did not become an admissible [`FileBlob`].
#[derive(Debug, Error)]
pub enum LocalFileError {
    /// The file could not be inspected or read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file's metadata violates one or more admission rules.
    #[error("{} rejected by admission rules", .0.len())]
    Rejected(Vec<AdmissionError>),
}

/// Errors returned by queue operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// No candidate with this identifier is queued.
    #[error("upload {0} is not queued")]
    NotFound(String),
    /// The candidate is being transferred and cannot be removed.
    #[error("upload {0} is in progress and cannot be removed")]
    InFlight(String),
    /// Another batch is already being processed.
    #[error("the upload queue is already being processed")]
    Busy,
}

/// Observable state changes emitted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UploadEvent {
    /// A file entered the queue.
    Admitted {
        /// Candidate identifier.
        id: String,
        /// File name.
        name: String,
    },
    /// A file was refused by admission.
    Rejected {
        /// File name.
        name: String,
        /// User-facing reason.
        reason: String,
    },
    /// A candidate left the queue at the user's request.
    Removed {
        /// Candidate identifier.
        id: String,
    },
    /// The processor picked up a candidate.
    Started {
        /// Candidate identifier.
        id: String,
    },
    /// Progress advanced for the candidate being transferred.
    Progress {
        /// Candidate identifier.
        id: String,
        /// Percentage, 0 to 100.
        progress: u8,
    },
    /// The batch was dropped mid-transfer and the candidate went back to `Pending`.
    Interrupted {
        /// Candidate identifier.
        id: String,
    },
    /// A candidate reached `Success`.
    Succeeded {
        /// Candidate identifier.
        id: String,
    },
    /// A candidate reached `Error`.
    Failed {
        /// Candidate identifier.
        id: String,
        /// Failure description.
        error: String,
    },
    /// Every candidate of the batch reached a terminal state.
    BatchCompleted {
        /// Number of successful transfers.
        succeeded: usize,
        /// Number of failed transfers.
        failed: usize,
    },
    /// Processed candidates were dropped after the display hold.
    Cleared {
        /// Number of candidates removed.
        removed: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_and_extension_follow_last_dot() {
        let blob = FileBlob::from_bytes("acta.final.PDF", "application/pdf", Bytes::new());
        assert_eq!(blob.stem(), "acta.final");
        assert_eq!(blob.extension().as_deref(), Some("pdf"));

        let bare = FileBlob::from_bytes("LEEME", "text/plain", Bytes::new());
        assert_eq!(bare.stem(), "LEEME");
        assert_eq!(bare.extension(), None);

        let hidden = FileBlob::from_bytes(".env", "text/plain", Bytes::new());
        assert_eq!(hidden.stem(), ".env");
    }

    #[test]
    fn admission_errors_name_the_file() {
        let too_large = AdmissionError::TooLarge {
            file_name: "tesis.pdf".into(),
            size: 11 * 1024 * 1024,
            limit: 10 * 1024 * 1024,
        };
        assert_eq!(too_large.to_string(), "tesis.pdf excede el límite de 10MB.");
        assert_eq!(too_large.title(), "Archivo muy grande");

        let invalid = AdmissionError::InvalidType {
            file_name: "foto.png".into(),
            mime_type: "image/png".into(),
        };
        assert_eq!(
            invalid.to_string(),
            "foto.png no es un tipo de archivo permitido."
        );
        assert_eq!(invalid.file_name(), "foto.png");
    }

    #[tokio::test]
    async fn from_path_reads_contents_and_infers_mime() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notas.txt");
        std::fs::write(&path, b"hola").expect("write");

        let blob = FileBlob::from_path(&path).await.expect("blob");
        assert_eq!(blob.name, "notas.txt");
        assert_eq!(blob.mime_type, "text/plain");
        assert_eq!(blob.size, 4);
        assert!(blob.path.is_some());
    }
}
