use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing search and upload activity.
#[derive(Default)]
pub struct ClientMetrics {
    searches_issued: AtomicU64,
    searches_succeeded: AtomicU64,
    search_timeouts: AtomicU64,
    search_failures: AtomicU64,
    stale_discarded: AtomicU64,
    files_admitted: AtomicU64,
    files_rejected: AtomicU64,
    files_uploaded: AtomicU64,
}

impl ClientMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a search invocation handed to the orchestrator.
    pub fn record_search_issued(&self) {
        self.searches_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a search that produced a result set.
    pub fn record_search_succeeded(&self) {
        self.searches_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a search cancelled by the timeout bound.
    pub fn record_search_timeout(&self) {
        self.search_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a search that failed against the backend.
    pub fn record_search_failure(&self) {
        self.search_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an outcome dropped because a newer search had been issued.
    pub fn record_stale_discarded(&self) {
        self.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one admission pass.
    pub fn record_admission(&self, admitted: u64, rejected: u64) {
        self.files_admitted.fetch_add(admitted, Ordering::Relaxed);
        self.files_rejected.fetch_add(rejected, Ordering::Relaxed);
    }

    /// Record files adopted into the result collection after an upload batch.
    pub fn record_uploaded(&self, count: u64) {
        self.files_uploaded.fetch_add(count, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            searches_issued: self.searches_issued.load(Ordering::Relaxed),
            searches_succeeded: self.searches_succeeded.load(Ordering::Relaxed),
            search_timeouts: self.search_timeouts.load(Ordering::Relaxed),
            search_failures: self.search_failures.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
            files_admitted: self.files_admitted.load(Ordering::Relaxed),
            files_rejected: self.files_rejected.load(Ordering::Relaxed),
            files_uploaded: self.files_uploaded.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of client counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Searches handed to the orchestrator, blank queries included.
    pub searches_issued: u64,
    /// Searches that returned a result set.
    pub searches_succeeded: u64,
    /// Searches cancelled by the timeout bound.
    pub search_timeouts: u64,
    /// Searches that failed with a backend or connectivity error.
    pub search_failures: u64,
    /// Outcomes dropped because a newer search superseded them.
    pub stale_discarded: u64,
    /// Files that passed admission.
    pub files_admitted: u64,
    /// Rejections produced by admission (a file may be rejected twice).
    pub files_rejected: u64,
    /// Files adopted into the result collection.
    pub files_uploaded: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_search_lifecycle() {
        let metrics = ClientMetrics::new();
        metrics.record_search_issued();
        metrics.record_search_issued();
        metrics.record_search_succeeded();
        metrics.record_search_timeout();
        metrics.record_stale_discarded();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.searches_issued, 2);
        assert_eq!(snapshot.searches_succeeded, 1);
        assert_eq!(snapshot.search_timeouts, 1);
        assert_eq!(snapshot.search_failures, 0);
        assert_eq!(snapshot.stale_discarded, 1);
    }

    #[test]
    fn records_upload_counters() {
        let metrics = ClientMetrics::new();
        metrics.record_admission(2, 1);
        metrics.record_admission(1, 0);
        metrics.record_uploaded(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.files_admitted, 3);
        assert_eq!(snapshot.files_rejected, 1);
        assert_eq!(snapshot.files_uploaded, 3);
    }

    #[test]
    fn snapshot_starts_empty() {
        assert_eq!(ClientMetrics::new().snapshot(), MetricsSnapshot::default());
    }
}
