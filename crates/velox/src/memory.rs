//! Allocation tracking for runtime items
//!
//! A [`MemoryTracker`] is a strategy object notified whenever the engine
//! allocates, resizes or frees an item cell. It only counts; reclaiming
//! memory is left to reference counting.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Snapshot of tracker counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Total cells allocated
    pub allocations: usize,
    /// Total cells freed
    pub frees: usize,
    /// Cells currently alive
    pub live: usize,
    /// Estimated bytes held by live cells
    pub live_bytes: usize,
    /// Highest `live_bytes` observed
    pub peak_bytes: usize,
}

/// Pluggable allocation accounting strategy.
pub trait MemoryTracker: Send + Sync + fmt::Debug {
    /// A cell of `bytes` was allocated.
    fn on_alloc(&self, bytes: usize);

    /// A cell of `bytes` was freed.
    fn on_free(&self, bytes: usize);

    /// A live cell changed size.
    fn on_resize(&self, _old: usize, _new: usize) {}

    /// Current counters.
    fn stats(&self) -> MemoryStats;
}

/// Shared handle to a tracker.
pub type TrackerHandle = Arc<dyn MemoryTracker>;

/// Tracker that ignores every event.
#[derive(Debug, Default)]
pub struct NullTracker;

impl MemoryTracker for NullTracker {
    fn on_alloc(&self, _bytes: usize) {}

    fn on_free(&self, _bytes: usize) {}

    fn stats(&self) -> MemoryStats {
        MemoryStats::default()
    }
}

/// Tracker counting allocations, frees and peak memory with atomics.
#[derive(Debug, Default)]
pub struct CountingTracker {
    allocations: AtomicUsize,
    frees: AtomicUsize,
    live_bytes: AtomicUsize,
    peak_bytes: AtomicUsize,
}

impl CountingTracker {
    /// Create a tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn grow(&self, bytes: usize) {
        let now = self.live_bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.peak_bytes.fetch_max(now, Ordering::Relaxed);
    }

    fn shrink(&self, bytes: usize) {
        // Saturate: a cell adopted mid-life may free more than it reported.
        let _ = self
            .live_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |live| {
                Some(live.saturating_sub(bytes))
            });
    }
}

impl MemoryTracker for CountingTracker {
    fn on_alloc(&self, bytes: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.grow(bytes);
    }

    fn on_free(&self, bytes: usize) {
        self.frees.fetch_add(1, Ordering::Relaxed);
        self.shrink(bytes);
    }

    fn on_resize(&self, old: usize, new: usize) {
        if new > old {
            self.grow(new - old);
        } else {
            self.shrink(old - new);
        }
    }

    fn stats(&self) -> MemoryStats {
        let allocations = self.allocations.load(Ordering::Relaxed);
        let frees = self.frees.load(Ordering::Relaxed);
        MemoryStats {
            allocations,
            frees,
            live: allocations.saturating_sub(frees),
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
            peak_bytes: self.peak_bytes.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_tracker_peak() {
        let tracker = CountingTracker::new();
        tracker.on_alloc(100);
        tracker.on_alloc(50);
        tracker.on_free(100);
        tracker.on_alloc(10);

        let stats = tracker.stats();
        assert_eq!(stats.allocations, 3);
        assert_eq!(stats.frees, 1);
        assert_eq!(stats.live, 2);
        assert_eq!(stats.live_bytes, 60);
        assert_eq!(stats.peak_bytes, 150);
    }

    #[test]
    fn test_counting_tracker_resize() {
        let tracker = CountingTracker::new();
        tracker.on_alloc(40);
        tracker.on_resize(40, 140);
        assert_eq!(tracker.stats().peak_bytes, 140);
        tracker.on_resize(140, 20);
        assert_eq!(tracker.stats().live_bytes, 20);
    }

    #[test]
    fn test_null_tracker_reports_nothing() {
        let tracker = NullTracker;
        tracker.on_alloc(1000);
        assert_eq!(tracker.stats(), MemoryStats::default());
    }
}
