//! Run-wide progress counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters shared by the source and every worker.
///
/// Only the final totals are meaningful; intermediate reads may observe any
/// interleaving.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    read: AtomicU64,
    processed: AtomicU64,
    matched: AtomicU64,
    skipped: AtomicU64,
    undelivered: AtomicU64,
}

/// Point-in-time copy of [`PipelineCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Lines pushed into the input queue
    pub read: u64,
    /// Lines fully handled by a worker
    pub processed: u64,
    /// Lines routed to a classifier-chosen destination
    pub matched: u64,
    /// Lines the classifier skipped
    pub skipped: u64,
    /// Lines whose destination writer had already failed
    pub undelivered: u64,
}

impl PipelineCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_read(&self) -> u64 {
        self.read.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_processed(&self) -> u64 {
        self.processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_matched(&self) -> u64 {
        self.matched.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_skipped(&self) -> u64 {
        self.skipped.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_undelivered(&self) -> u64 {
        self.undelivered.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn read(&self) -> u64 {
        self.read.load(Ordering::Relaxed)
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn matched(&self) -> u64 {
        self.matched.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            read: self.read.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            undelivered: self.undelivered.load(Ordering::Relaxed),
        }
    }
}
