//! Lock-free counters shared by the feeder and the drainer.

use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};

/// In-flight and failure accounting for one run.
///
/// In-flight is only incremented by the feeder and only decremented by the drainer, so it
/// never goes negative. Every update is a single atomic RMW; there is no lock.
#[derive(Debug, Default)]
pub struct FlowCounters {
    in_flight: AtomicIsize,
    peak_in_flight: AtomicIsize,
    submitted: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    rejected: AtomicUsize,
}

impl FlowCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful submission. Returns the new in-flight count.
    pub fn add_in_flight(&self) -> isize {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        let depth = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(depth, Ordering::Relaxed);
        depth
    }

    /// Record one retrieval (success or failure). Returns the new in-flight count.
    pub fn sub_in_flight(&self) -> isize {
        self.in_flight.fetch_sub(1, Ordering::AcqRel) - 1
    }

    pub fn in_flight(&self) -> isize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Processing failure: the item was in flight and has now been retrieved.
    pub fn record_failure(&self) -> usize {
        self.failed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Submission failure: the item never entered the pool.
    pub fn record_rejection(&self) -> usize {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        self.record_failure()
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn peak_in_flight(&self) -> isize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }
}
