//! Engine metrics
//!
//! Atomic counters shared by the ingest path, the orchestrator and callers
//! holding an engine handle.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the write engine
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Rows accepted into the buffer
    pub rows_ingested: AtomicU64,

    /// Rows refused (engine stopped or wrong table)
    pub rows_rejected: AtomicU64,

    /// Batches handed to the write pool
    pub batches_submitted: AtomicU64,

    /// Batches the store accepted
    pub batches_written: AtomicU64,

    /// Rows the store accepted
    pub rows_written: AtomicU64,

    /// Batches dropped after a write failure
    pub write_errors: AtomicU64,

    /// Rows dropped with failed batches
    pub rows_dropped: AtomicU64,

    /// Write failures folded into a later log line
    pub failures_unlogged: AtomicU64,

    /// Flushes performed, final flush included
    pub flush_cycles: AtomicU64,

    /// Flushes that found the buffer empty
    pub empty_flushes: AtomicU64,
}

impl EngineMetrics {
    pub const fn new() -> Self {
        Self {
            rows_ingested: AtomicU64::new(0),
            rows_rejected: AtomicU64::new(0),
            batches_submitted: AtomicU64::new(0),
            batches_written: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            rows_dropped: AtomicU64::new(0),
            failures_unlogged: AtomicU64::new(0),
            flush_cycles: AtomicU64::new(0),
            empty_flushes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_ingested(&self) {
        self.rows_ingested.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected(&self) {
        self.rows_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_submitted(&self) {
        self.batches_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch the store accepted
    #[inline]
    pub fn record_written(&self, rows: u64) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.rows_written.fetch_add(rows, Ordering::Relaxed);
    }

    /// Record a dropped batch; `rows` is zero when the task died
    #[inline]
    pub fn record_write_error(&self, rows: u64) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
        self.rows_dropped.fetch_add(rows, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unlogged_failure(&self) {
        self.failures_unlogged.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_flush(&self, empty: bool) {
        self.flush_cycles.fetch_add(1, Ordering::Relaxed);
        if empty {
            self.empty_flushes.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> EngineMetricsSnapshot {
        EngineMetricsSnapshot {
            rows_ingested: self.rows_ingested.load(Ordering::Relaxed),
            rows_rejected: self.rows_rejected.load(Ordering::Relaxed),
            batches_submitted: self.batches_submitted.load(Ordering::Relaxed),
            batches_written: self.batches_written.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            rows_dropped: self.rows_dropped.load(Ordering::Relaxed),
            failures_unlogged: self.failures_unlogged.load(Ordering::Relaxed),
            flush_cycles: self.flush_cycles.load(Ordering::Relaxed),
            empty_flushes: self.empty_flushes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineMetricsSnapshot {
    pub rows_ingested: u64,
    pub rows_rejected: u64,
    pub batches_submitted: u64,
    pub batches_written: u64,
    pub rows_written: u64,
    pub write_errors: u64,
    pub rows_dropped: u64,
    pub failures_unlogged: u64,
    pub flush_cycles: u64,
    pub empty_flushes: u64,
}

impl EngineMetricsSnapshot {
    /// Batches submitted whose outcome has not been observed yet
    pub fn batches_pending(&self) -> u64 {
        self.batches_submitted
            .saturating_sub(self.batches_written + self.write_errors)
    }
}
