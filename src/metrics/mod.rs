//! Queue Metrics
//!
//! Per-queue operation counters. They are plain relaxed atomics updated next
//! to the queue's critical sections, so reading them never contends with
//! producers or consumers. Snapshots are advisory: counters are read one at
//! a time and may be mutually inconsistent under load.

use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Point-in-time view of a queue's counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueMetrics {
    /// Items accepted by `push`
    pub pushes: u64,
    /// Pushes rejected because the queue was full
    pub rejected_full: u64,
    /// Pushes rejected because the queue was cancelled
    pub rejected_cancelled: u64,
    /// Items handed out by `pop`
    pub pops: u64,
    /// Non-blocking pops that found the queue empty
    pub empty_pops: u64,
    /// Pops that returned because the queue was cancelled
    pub cancelled_pops: u64,
    /// Times a blocking pop went to sleep on the condition variable
    pub waits: u64,
    /// Largest length observed right after a push
    pub peak_len: usize,
}

impl QueueMetrics {
    /// All push attempts, successful or not
    pub fn push_attempts(&self) -> u64 {
        self.pushes + self.rejected_full + self.rejected_cancelled
    }

    /// All pop attempts, successful or not
    pub fn pop_attempts(&self) -> u64 {
        self.pops + self.empty_pops + self.cancelled_pops
    }

    /// Percentage of pushes rejected for lack of capacity
    pub fn rejection_rate(&self) -> f64 {
        let attempts = self.push_attempts();
        if attempts == 0 {
            0.0
        } else {
            (self.rejected_full as f64 / attempts as f64) * 100.0
        }
    }

    /// Percentage of pop attempts that produced an item
    pub fn hit_rate(&self) -> f64 {
        let attempts = self.pop_attempts();
        if attempts == 0 {
            0.0
        } else {
            (self.pops as f64 / attempts as f64) * 100.0
        }
    }
}

/// Internal atomic counters backing [`QueueMetrics`]
#[derive(Debug)]
pub struct AtomicMetrics {
    enabled: AtomicBool,
    pushes: AtomicU64,
    rejected_full: AtomicU64,
    rejected_cancelled: AtomicU64,
    pops: AtomicU64,
    empty_pops: AtomicU64,
    cancelled_pops: AtomicU64,
    waits: AtomicU64,
    peak_len: AtomicUsize,
}

impl Default for AtomicMetrics {
    fn default() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            pushes: AtomicU64::new(0),
            rejected_full: AtomicU64::new(0),
            rejected_cancelled: AtomicU64::new(0),
            pops: AtomicU64::new(0),
            empty_pops: AtomicU64::new(0),
            cancelled_pops: AtomicU64::new(0),
            waits: AtomicU64::new(0),
            peak_len: AtomicUsize::new(0),
        }
    }
}

impl AtomicMetrics {
    #[inline]
    fn bump(&self, counter: &AtomicU64) {
        if self.enabled.load(Ordering::Relaxed) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an accepted push and the resulting length
    #[inline]
    pub fn record_push(&self, len: usize) {
        if self.enabled.load(Ordering::Relaxed) {
            self.pushes.fetch_add(1, Ordering::Relaxed);
            self.peak_len.fetch_max(len, Ordering::Relaxed);
        }
    }

    /// Record a push rejected by the capacity check
    #[inline]
    pub fn record_full(&self) {
        self.bump(&self.rejected_full);
    }

    /// Record a push rejected after cancellation
    #[inline]
    pub fn record_push_cancelled(&self) {
        self.bump(&self.rejected_cancelled);
    }

    /// Record an item handed to a consumer
    #[inline]
    pub fn record_pop(&self) {
        self.bump(&self.pops);
    }

    /// Record a non-blocking pop on an empty queue
    #[inline]
    pub fn record_empty(&self) {
        self.bump(&self.empty_pops);
    }

    /// Record a pop released by cancellation
    #[inline]
    pub fn record_pop_cancelled(&self) {
        self.bump(&self.cancelled_pops);
    }

    /// Record a consumer going to sleep
    #[inline]
    pub fn record_wait(&self) {
        self.bump(&self.waits);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> QueueMetrics {
        QueueMetrics {
            pushes: self.pushes.load(Ordering::Relaxed),
            rejected_full: self.rejected_full.load(Ordering::Relaxed),
            rejected_cancelled: self.rejected_cancelled.load(Ordering::Relaxed),
            pops: self.pops.load(Ordering::Relaxed),
            empty_pops: self.empty_pops.load(Ordering::Relaxed),
            cancelled_pops: self.cancelled_pops.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            peak_len: self.peak_len.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.pushes.store(0, Ordering::Relaxed);
        self.rejected_full.store(0, Ordering::Relaxed);
        self.rejected_cancelled.store(0, Ordering::Relaxed);
        self.pops.store(0, Ordering::Relaxed);
        self.empty_pops.store(0, Ordering::Relaxed);
        self.cancelled_pops.store(0, Ordering::Relaxed);
        self.waits.store(0, Ordering::Relaxed);
        self.peak_len.store(0, Ordering::Relaxed);
    }

    /// Turn recording on or off; existing counts are kept
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether recording is on
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

/// Trait for data structures that expose operation metrics
pub trait MetricsCollector {
    /// Get current metrics
    fn metrics(&self) -> QueueMetrics;

    /// Reset all metrics
    fn reset_metrics(&self);

    /// Enable or disable metrics collection
    fn set_metrics_enabled(&self, enabled: bool);

    /// Check if metrics collection is enabled
    fn is_metrics_enabled(&self) -> bool;
}
