//! Counters for the statistics cache: how `get` calls were served and how
//! long each fresh computation took.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;

/// Shared between the cache (writes) and the API (reads).
pub struct CacheMetrics {
    /// Compute time per miss in microseconds; fetch time excluded.
    compute_us: Mutex<Histogram<u64>>,
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    stale_discards: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    /// `get` calls that started a computation.
    pub misses: u64,
    /// `get` calls that joined a computation already in flight.
    pub coalesced: u64,
    /// Results handed back but not stored, because the key was invalidated
    /// while they were computing.
    pub stale_discards: u64,
    pub computed: u64,
    pub compute_p50_us: Option<u64>,
    pub compute_p95_us: Option<u64>,
    pub compute_p99_us: Option<u64>,
}

impl CacheMetrics {
    /// Tracks 1us to 100s at 3 significant figures.
    pub fn new() -> Self {
        let histogram =
            Histogram::new_with_bounds(1, 100_000_000, 3).expect("valid histogram bounds");
        Self {
            compute_us: Mutex::new(histogram),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            stale_discards: AtomicU64::new(0),
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_discard(&self) {
        self.stale_discards.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_compute(&self, d: Duration) {
        let us = d.as_micros().clamp(1, u128::from(u64::MAX)) as u64;
        if let Ok(mut h) = self.compute_us.lock() {
            let _ = h.record(us);
        }
    }

    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        let (computed, p50, p95, p99) = match self.compute_us.lock() {
            Ok(h) if h.len() > 0 => (
                h.len(),
                Some(h.value_at_quantile(0.5)),
                Some(h.value_at_quantile(0.95)),
                Some(h.value_at_quantile(0.99)),
            ),
            Ok(h) => (h.len(), None, None, None),
            Err(_) => (0, None, None, None),
        };
        CacheMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            stale_discards: self.stale_discards.load(Ordering::Relaxed),
            computed,
            compute_p50_us: p50,
            compute_p95_us: p95,
            compute_p99_us: p99,
        }
    }
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::new()
    }
}
