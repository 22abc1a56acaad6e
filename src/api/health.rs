//! Shared health state for the /health endpoint.
//! Updated by the import route and DbWriter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared health metrics. Updated by service components, read by API.
#[derive(Default)]
pub struct HealthState {
    /// Nanosecond timestamp of the last persisted import batch (0 = none).
    pub last_import_at_ns: AtomicU64,
    /// Approximate count of import batches queued for DB write.
    pub write_queue_pending: AtomicU64,
    /// Lifetime count of draw records newly persisted.
    pub records_imported: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_last_import_at_ns(&self, ns: u64) {
        self.last_import_at_ns.store(ns, Ordering::Relaxed);
    }

    pub fn inc_write_queue_pending(&self) {
        self.write_queue_pending.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_write_queue_pending(&self) {
        let _ = self
            .write_queue_pending
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }

    pub fn add_records_imported(&self, n: u64) {
        self.records_imported.fetch_add(n, Ordering::Relaxed);
    }

    pub fn last_import_at_ns(&self) -> u64 {
        self.last_import_at_ns.load(Ordering::Relaxed)
    }

    pub fn write_queue_pending(&self) -> u64 {
        self.write_queue_pending.load(Ordering::Relaxed)
    }

    pub fn records_imported(&self) -> u64 {
        self.records_imported.load(Ordering::Relaxed)
    }
}
