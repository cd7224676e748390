//! Bus counters for observability and the stop() report

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared between publisher and dispatch loop.
#[derive(Debug, Default)]
pub struct BusMetrics {
    /// Events accepted by publish()
    published: AtomicU64,

    /// Handler invocations that completed (including handler errors)
    delivered: AtomicU64,

    /// Best-effort events evicted by newer ones
    dropped: AtomicU64,

    /// Handler invocations that returned an error or panicked
    handler_errors: AtomicU64,
}

impl BusMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handler_error(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Snapshot for the shutdown report.
    pub fn snapshot(&self) -> BusStats {
        BusStats {
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
        }
    }
}

/// Counters reported by `EventBus::stop` after the drain completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BusStats {
    pub published: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub handler_errors: u64,
}
