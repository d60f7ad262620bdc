use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    rows_extracted: AtomicU64,
    batches_written: AtomicU64,
    bytes_written: AtomicU64,
    write_retries: AtomicU64,
    table_failures: AtomicU64,
    jobs_completed: AtomicU64,
}

/// Run-wide counters shared across table pipelines. Cloning shares the
/// underlying counters.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MetricsSnapshot {
    pub rows_extracted: u64,
    pub batches_written: u64,
    pub bytes_written: u64,
    pub write_retries: u64,
    pub table_failures: u64,
    pub jobs_completed: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics::default()
    }

    pub fn increment_rows(&self, count: u64) {
        self.inner.rows_extracted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_batches(&self, count: u64) {
        self.inner.batches_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_bytes(&self, count: u64) {
        self.inner.bytes_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_write_retries(&self, count: u64) {
        self.inner.write_retries.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_table_failures(&self, count: u64) {
        self.inner.table_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_jobs_completed(&self, count: u64) {
        self.inner.jobs_completed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_extracted: self.inner.rows_extracted.load(Ordering::Relaxed),
            batches_written: self.inner.batches_written.load(Ordering::Relaxed),
            bytes_written: self.inner.bytes_written.load(Ordering::Relaxed),
            write_retries: self.inner.write_retries.load(Ordering::Relaxed),
            table_failures: self.inner.table_failures.load(Ordering::Relaxed),
            jobs_completed: self.inner.jobs_completed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = Metrics::new();
        let clone = metrics.clone();
        clone.increment_rows(10);
        metrics.increment_rows(5);
        assert_eq!(metrics.snapshot().rows_extracted, 15);
    }
}
