use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    rows_loaded: AtomicU64,
    bytes_loaded: AtomicU64,
    rows_deleted: AtomicU64,
    commits: AtomicU64,
    retries: AtomicU64,
}

/// Counters for one load session. Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rows_loaded: u64,
    pub bytes_loaded: u64,
    pub rows_deleted: u64,
    pub commits: u64,
    pub retries: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_rows_loaded(&self, count: u64) {
        self.inner.rows_loaded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_bytes_loaded(&self, count: u64) {
        self.inner.bytes_loaded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_rows_deleted(&self, count: u64) {
        self.inner.rows_deleted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_commits(&self, count: u64) {
        self.inner.commits.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_retries(&self, count: u64) {
        self.inner.retries.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_loaded: self.inner.rows_loaded.load(Ordering::Relaxed),
            bytes_loaded: self.inner.bytes_loaded.load(Ordering::Relaxed),
            rows_deleted: self.inner.rows_deleted.load(Ordering::Relaxed),
            commits: self.inner.commits.load(Ordering::Relaxed),
            retries: self.inner.retries.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
