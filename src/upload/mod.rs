//! Upload admission and sequential queue processing.

pub mod admission;
mod pipeline;
pub mod transport;
pub mod types;

pub use admission::{ACCEPTED_EXTENSIONS, ACCEPTED_MIME_TYPES};
pub use pipeline::{UploadPipeline, follow_batch};
pub use transport::{SimulatedTransport, UploadTransport};
pub use types::{
    AdmissionError, AdmissionReport, FileBlob, LocalFileError, UploadCandidate, UploadError,
    UploadEvent, UploadStatus,
};
