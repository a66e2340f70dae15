//! Delivery statistics for stream readers

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by one reader's delivery task
#[derive(Debug, Default)]
pub struct ReaderStats {
    delivered: AtomicU64,
    skipped: AtomicU64,
}

impl ReaderStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame handed to the subscriber callback
    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record frames skipped because the reader lagged its channel
    pub(crate) fn record_skipped(&self, count: u64) {
        self.skipped.fetch_add(count, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of the counters
    pub fn snapshot(&self) -> ReaderStatsSnapshot {
        ReaderStatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a reader's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStatsSnapshot {
    /// Frames handed to the subscriber callback
    pub delivered: u64,
    /// Frames skipped while the reader lagged
    pub skipped: u64,
}
