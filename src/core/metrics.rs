//! Engine metrics for observability
//!
//! Counters for rendered lines and bytes, sink failures, suppressed
//! escalations, records filtered out by the level threshold and stack walks
//! done to resolve callers.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for engine observability
///
/// # Example
///
/// ```
/// use rust_structured_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_rendered(42);
/// metrics.record_filtered();
///
/// assert_eq!(metrics.lines_rendered(), 1);
/// assert_eq!(metrics.bytes_rendered(), 42);
/// assert_eq!(metrics.filtered(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Lines rendered and routed
    lines_rendered: AtomicU64,

    /// Bytes rendered, counted once per line before routing
    bytes_rendered: AtomicU64,

    /// Failed sink writes
    write_failures: AtomicU64,

    /// Panic/Fatal escalations skipped because of testing or no-interrupt mode
    escalations_suppressed: AtomicU64,

    /// Records dropped by the level threshold
    filtered: AtomicU64,

    /// Backtraces captured to resolve a caller through extra frames
    caller_lookups: AtomicU64,
}

/// Point-in-time copy of [`LoggerMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub lines_rendered: u64,
    pub bytes_rendered: u64,
    pub write_failures: u64,
    pub escalations_suppressed: u64,
    pub filtered: u64,
    pub caller_lookups: u64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            lines_rendered: AtomicU64::new(0),
            bytes_rendered: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            escalations_suppressed: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            caller_lookups: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn lines_rendered(&self) -> u64 {
        self.lines_rendered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes_rendered(&self) -> u64 {
        self.bytes_rendered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn escalations_suppressed(&self) -> u64 {
        self.escalations_suppressed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn caller_lookups(&self) -> u64 {
        self.caller_lookups.load(Ordering::Relaxed)
    }

    /// Record a rendered line of `bytes` length; returns the previous line count
    #[inline]
    pub fn record_rendered(&self, bytes: usize) -> u64 {
        self.bytes_rendered.fetch_add(bytes as u64, Ordering::Relaxed);
        self.lines_rendered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_escalation_suppressed(&self) -> u64 {
        self.escalations_suppressed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_caller_lookup(&self) -> u64 {
        self.caller_lookups.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of rendered lines that hit at least one failing sink (0.0 - 100.0)
    pub fn failure_rate(&self) -> f64 {
        let rendered = self.lines_rendered() as f64;
        if rendered == 0.0 {
            0.0
        } else {
            (self.write_failures() as f64 / rendered) * 100.0
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_rendered: self.lines_rendered(),
            bytes_rendered: self.bytes_rendered(),
            write_failures: self.write_failures(),
            escalations_suppressed: self.escalations_suppressed(),
            filtered: self.filtered(),
            caller_lookups: self.caller_lookups(),
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.lines_rendered.store(0, Ordering::Relaxed);
        self.bytes_rendered.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.escalations_suppressed.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.caller_lookups.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_record_rendered() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_rendered(10), 0); // Returns previous value
        metrics.record_rendered(5);
        assert_eq!(metrics.lines_rendered(), 2);
        assert_eq!(metrics.bytes_rendered(), 15);
    }

    #[test]
    fn test_failure_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.failure_rate(), 0.0);

        for _ in 0..10 {
            metrics.record_rendered(1);
        }
        metrics.record_write_failure();
        let rate = metrics.failure_rate();
        assert!((9.9..=10.1).contains(&rate), "Failure rate was {}", rate);
    }

    #[test]
    fn test_reset() {
        let metrics = LoggerMetrics::new();
        metrics.record_filtered();
        metrics.record_escalation_suppressed();
        metrics.record_caller_lookup();
        metrics.reset();
        assert_eq!(metrics.caller_lookups(), 0);
        assert_eq!(metrics.filtered(), 0);
        assert_eq!(metrics.escalations_suppressed(), 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = LoggerMetrics::new();
        metrics.record_rendered(3);
        let json = serde_json::to_string(&metrics.snapshot()).unwrap();
        assert!(json.contains("\"lines_rendered\":1"));
        assert!(json.contains("\"bytes_rendered\":3"));
    }
}
