//! Upload queue: admission, pre-start removal, and strictly sequential processing.

use crate::{
    config::UploadSettings,
    upload::{
        admission::validate,
        transport::{SimulatedTransport, UploadTransport},
        types::{
            AdmissionError, AdmissionReport, FileBlob, LocalFileError, UploadCandidate,
            UploadError, UploadEvent, UploadStatus,
        },
    },
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast::{self, error::RecvError};

const EVENT_CAPACITY: usize = 256;

type Queue = Arc<Mutex<Vec<UploadCandidate>>>;

/// Owns the upload queue and drives candidates through the transport one at a time.
///
/// Observers follow progress through [`UploadPipeline::subscribe`] or poll
/// [`UploadPipeline::snapshot`]; only the pipeline mutates queued candidates.
pub struct UploadPipeline {
    settings: UploadSettings,
    queue: Queue,
    events: broadcast::Sender<UploadEvent>,
    transport: Box<dyn UploadTransport>,
    processing: AtomicBool,
}

impl UploadPipeline {
    /// Build a pipeline backed by the simulated transport.
    pub fn new(settings: UploadSettings) -> Self {
        let transport = SimulatedTransport::new(settings.step_delay);
        Self::with_transport(settings, Box::new(transport))
    }

    /// Build a pipeline around an arbitrary transport.
    pub fn with_transport(settings: UploadSettings, transport: Box<dyn UploadTransport>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            settings,
            queue: Arc::new(Mutex::new(Vec::new())),
            events,
            transport,
            processing: AtomicBool::new(false),
        }
    }

    /// Subscribe to queue state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.events.subscribe()
    }

    /// Copy of the queue in admission order.
    pub fn snapshot(&self) -> Vec<UploadCandidate> {
        lock(&self.queue).clone()
    }

    /// Whether any candidate is waiting to be processed.
    pub fn has_pending(&self) -> bool {
        lock(&self.queue)
            .iter()
            .any(|candidate| candidate.status == UploadStatus::Pending)
    }

    /// Whether a batch is currently being processed.
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Validate candidate files and append the admitted ones to the queue.
    ///
    /// Each file is judged independently; rejections never affect other files in the batch.
    pub fn admit(&self, files: Vec<FileBlob>) -> AdmissionReport {
        let mut report = AdmissionReport::default();
        for file in files {
            self.judge(file, &mut report);
        }
        self.enqueue(report)
    }

    /// Admit files from disk, checking each path's metadata before reading its contents.
    ///
    /// Paths that cannot be read are logged and skipped without affecting the others.
    pub async fn admit_paths(&self, paths: &[PathBuf]) -> AdmissionReport {
        let mut report = AdmissionReport::default();
        for path in paths {
            match FileBlob::open_admissible(path, self.settings.max_file_bytes).await {
                Ok(file) => self.judge(file, &mut report),
                Err(LocalFileError::Rejected(violations)) => {
                    for violation in violations {
                        self.reject(violation, &mut report);
                    }
                }
                Err(error @ LocalFileError::Io { .. }) => {
                    tracing::warn!(path = %path.display(), error = %error, "Skipping unreadable upload candidate");
                }
            }
        }
        self.enqueue(report)
    }

    fn judge(&self, file: FileBlob, report: &mut AdmissionReport) {
        let violations = validate(&file, self.settings.max_file_bytes);
        if violations.is_empty() {
            report.admitted.push(UploadCandidate::pending(file));
            return;
        }
        for violation in violations {
            self.reject(violation, report);
        }
    }

    fn reject(&self, violation: AdmissionError, report: &mut AdmissionReport) {
        tracing::warn!(
            file = violation.file_name(),
            reason = %violation,
            "Rejected upload candidate"
        );
        self.emit(UploadEvent::Rejected {
            name: violation.file_name().to_string(),
            reason: violation.to_string(),
        });
        report.rejected.push(violation);
    }

    fn enqueue(&self, report: AdmissionReport) -> AdmissionReport {
        lock(&self.queue).extend(report.admitted.iter().cloned());
        for candidate in &report.admitted {
            tracing::debug!(id = %candidate.id, file = %candidate.file.name, "Admitted upload candidate");
            self.emit(UploadEvent::Admitted {
                id: candidate.id.clone(),
                name: candidate.file.name.clone(),
            });
        }

        tracing::info!(
            admitted = report.admitted.len(),
            rejected = report.rejected.len(),
            "Admission completed"
        );
        report
    }

    /// Remove a candidate that is not currently being transferred.
    pub fn remove(&self, id: &str) -> Result<UploadCandidate, UploadError> {
        let removed = {
            let mut queue = lock(&self.queue);
            let index = queue
                .iter()
                .position(|candidate| candidate.id == id)
                .ok_or_else(|| UploadError::NotFound(id.to_string()))?;
            if queue[index].status == UploadStatus::Uploading {
                return Err(UploadError::InFlight(id.to_string()));
            }
            queue.remove(index)
        };

        tracing::debug!(id, file = %removed.file.name, "Removed upload candidate");
        self.emit(UploadEvent::Removed { id: id.to_string() });
        Ok(removed)
    }

    /// Process every pending candidate in queue order and return the files that succeeded.
    ///
    /// Candidates admitted after the call starts wait for the next batch. Processed candidates
    /// stay visible for the configured display hold and are then dropped from the queue.
    ///
    /// Dropping the returned future mid-transfer puts the interrupted candidate back to
    /// `Pending` so it can be removed or picked up by the next batch.
    pub async fn process_queue(&self) -> Result<Vec<FileBlob>, UploadError> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(UploadError::Busy);
        }
        let mut guard = BatchGuard::new(self);

        let batch: Vec<String> = lock(&self.queue)
            .iter()
            .filter(|candidate| candidate.status == UploadStatus::Pending)
            .map(|candidate| candidate.id.clone())
            .collect();
        if batch.is_empty() {
            tracing::debug!("Upload queue has no pending candidates");
            guard.complete();
            return Ok(Vec::new());
        }

        tracing::info!(files = batch.len(), "Processing upload queue");
        let mut uploaded = Vec::new();
        let mut failed = 0;

        for id in &batch {
            let Some(file) = self.start(id) else {
                tracing::debug!(id = %id, "Candidate left the queue before processing");
                continue;
            };
            guard.in_flight = Some(id.clone());

            let report_progress = |value: u8| self.record_progress(id, value);
            let result = self.transport.transfer(&file, &report_progress).await;
            guard.in_flight = None;
            guard.processed.insert(id.clone());

            match result {
                Ok(()) => {
                    self.finish(id, UploadStatus::Success, None);
                    tracing::info!(id = %id, file = %file.name, "Upload succeeded");
                    self.emit(UploadEvent::Succeeded { id: id.clone() });
                    uploaded.push(file);
                }
                Err(error) => {
                    self.finish(id, UploadStatus::Error, Some(error.clone()));
                    tracing::error!(id = %id, file = %file.name, error = %error, "Upload failed");
                    self.emit(UploadEvent::Failed {
                        id: id.clone(),
                        error,
                    });
                    failed += 1;
                }
            }
        }

        self.emit(UploadEvent::BatchCompleted {
            succeeded: uploaded.len(),
            failed,
        });
        tracing::info!(succeeded = uploaded.len(), failed, "Upload batch completed");
        guard.complete();
        Ok(uploaded)
    }

    fn start(&self, id: &str) -> Option<FileBlob> {
        let file = {
            let mut queue = lock(&self.queue);
            let candidate = queue
                .iter_mut()
                .find(|candidate| candidate.id == id && candidate.status == UploadStatus::Pending)?;
            candidate.status = UploadStatus::Uploading;
            candidate.progress = 0;
            candidate.file.clone()
        };
        self.emit(UploadEvent::Started { id: id.to_string() });
        Some(file)
    }

    fn record_progress(&self, id: &str, value: u8) {
        let value = value.min(100);
        {
            let mut queue = lock(&self.queue);
            if let Some(candidate) = queue.iter_mut().find(|candidate| candidate.id == id) {
                candidate.progress = candidate.progress.max(value);
            }
        }
        tracing::debug!(id, progress = value, "Upload progress");
        self.emit(UploadEvent::Progress {
            id: id.to_string(),
            progress: value,
        });
    }

    fn finish(&self, id: &str, status: UploadStatus, error: Option<String>) {
        let mut queue = lock(&self.queue);
        if let Some(candidate) = queue.iter_mut().find(|candidate| candidate.id == id) {
            if status == UploadStatus::Success {
                candidate.progress = 100;
            }
            candidate.status = status;
            candidate.error = error;
        }
    }

    fn requeue(&self, id: &str) {
        let requeued = {
            let mut queue = lock(&self.queue);
            match queue
                .iter_mut()
                .find(|candidate| candidate.id == id && candidate.status == UploadStatus::Uploading)
            {
                Some(candidate) => {
                    candidate.status = UploadStatus::Pending;
                    candidate.progress = 0;
                    true
                }
                None => false,
            }
        };
        if requeued {
            tracing::warn!(id, "Upload interrupted; candidate returned to the queue");
            self.emit(UploadEvent::Interrupted { id: id.to_string() });
        }
    }

    fn schedule_clear(&self, processed: HashSet<String>) {
        if processed.is_empty() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(
                candidates = processed.len(),
                "No runtime available; processed uploads stay queued"
            );
            return;
        };
        let queue = Arc::clone(&self.queue);
        let events = self.events.clone();
        let hold = self.settings.display_hold;
        runtime.spawn(async move {
            tokio::time::sleep(hold).await;
            let removed = {
                let mut queue = lock(&queue);
                let before = queue.len();
                queue.retain(|candidate| !processed.contains(&candidate.id));
                before - queue.len()
            };
            tracing::debug!(removed, "Cleared processed uploads");
            let _ = events.send(UploadEvent::Cleared { removed });
        });
    }

    fn emit(&self, event: UploadEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

/// Log upload events until a batch completes and return its `(succeeded, failed)` tally.
///
/// Events missed because the receiver fell behind are skipped; `None` means the pipeline was
/// dropped before the batch completed.
pub async fn follow_batch(mut events: broadcast::Receiver<UploadEvent>) -> Option<(usize, usize)> {
    loop {
        match events.recv().await {
            Ok(UploadEvent::Progress { id, progress }) => {
                tracing::info!(%id, progress, "Uploading");
            }
            Ok(UploadEvent::Failed { id, error }) => {
                tracing::warn!(%id, %error, "Upload failed");
            }
            Ok(UploadEvent::BatchCompleted { succeeded, failed }) => {
                tracing::info!(succeeded, failed, "Upload batch completed");
                return Some((succeeded, failed));
            }
            Ok(other) => tracing::debug!(event = ?other, "Upload event"),
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Upload event reporter fell behind");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

/// Releases the processing flag when a batch ends, however it ends.
struct BatchGuard<'a> {
    pipeline: &'a UploadPipeline,
    in_flight: Option<String>,
    processed: HashSet<String>,
}

impl<'a> BatchGuard<'a> {
    fn new(pipeline: &'a UploadPipeline) -> Self {
        Self {
            pipeline,
            in_flight: None,
            processed: HashSet::new(),
        }
    }

    fn complete(&mut self) {
        let processed = std::mem::take(&mut self.processed);
        self.pipeline.schedule_clear(processed);
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.in_flight.take() {
            self.pipeline.requeue(&id);
        }
        // Candidates finished before a cancellation still leave after the hold.
        self.complete();
        self.pipeline.processing.store(false, Ordering::SeqCst);
    }
}

fn lock(queue: &Mutex<Vec<UploadCandidate>>) -> MutexGuard<'_, Vec<UploadCandidate>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}
