//! Health counters for the primary writer and the notification sink
//!
//! Not a metrics system: plain atomics an operator or a test can read back.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the primary log writer
///
/// # Example
///
/// ```
/// use rust_scoped_logger::WriterMetrics;
///
/// let metrics = WriterMetrics::new();
/// metrics.record_written();
/// metrics.record_failed();
///
/// assert_eq!(metrics.records_written(), 1);
/// assert_eq!(metrics.records_failed(), 1);
/// ```
#[derive(Debug)]
pub struct WriterMetrics {
    /// Records accepted by every matching stream
    records_written: AtomicU64,

    /// Records at least one stream failed (error or panic) to write
    records_failed: AtomicU64,
}

impl WriterMetrics {
    pub const fn new() -> Self {
        Self {
            records_written: AtomicU64::new(0),
            records_failed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_failed(&self) -> u64 {
        self.records_failed.load(Ordering::Relaxed)
    }

    /// Record a written record, returning the previous count
    #[inline]
    pub fn record_written(&self) -> u64 {
        self.records_written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.records_failed.fetch_add(1, Ordering::Relaxed)
    }

    /// Failure rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been written.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.records_failed() as f64;
        let total = self.records_written() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }
}

impl Default for WriterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters for the notification sink
#[derive(Debug)]
pub struct NotificationMetrics {
    sent: AtomicU64,
    /// Below the threshold level, or no channel to deliver to
    suppressed: AtomicU64,
    failed: AtomicU64,
}

impl NotificationMetrics {
    pub const fn new() -> Self {
        Self {
            sent: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn suppressed(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sent(&self) -> u64 {
        self.sent.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_suppressed(&self) -> u64 {
        self.suppressed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for NotificationMetrics {
    fn default() -> Self {
        Self::new()
    }
}
