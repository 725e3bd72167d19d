//! Bounded Blocking Queue
//!
//! A FIFO queue guarded by a single mutex and a single condition variable,
//! with a capacity ceiling and a one-way cancellation flag.
//!
//! ## Wake-up protocol
//!
//! ```text
//! push (len 0 -> 1)   ----notify_one---->   one sleeping pop
//! pop  (len n -> n-1, n-1 > 0) --notify_one--> next sleeping pop
//! cancel              ----notify_all---->   every sleeping pop
//! ```
//!
//! A push only signals on the empty to non-empty edge. A burst of pushes
//! therefore wakes one consumer, and each consumer that leaves items behind
//! wakes the next one.
//!
//! Every wake is re-checked under the lock, so spurious wake-ups only cost a
//! loop iteration.
//!
//! ## Cancellation
//!
//! Cancellation never drains the queue. A blocking pop checks the flag before
//! looking at the items and fails once it is set; a non-blocking pop keeps
//! handing out whatever is still queued. This is what lets a thread pool
//! stop its workers and still recover the tasks they never started.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::sync::{Condvar, Mutex};
use crate::{Error, PushError, Result};

#[cfg(feature = "metrics")]
use crate::metrics::{AtomicMetrics, MetricsCollector, QueueMetrics};

/// Everything the mutex protects
#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    cancelled: bool,
}

/// A bounded, cancellable, multi-producer multi-consumer blocking queue
///
/// Items are delivered in push order, each to exactly one successful
/// [`pop`](Self::pop). Ownership moves into the queue on a successful
/// [`push`](Self::push) and out of it on a successful pop; a rejected push
/// returns the item inside [`PushError`].
///
/// # Examples
///
/// ```rust
/// use msgq::BoundedBlockingQueue;
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(BoundedBlockingQueue::with_capacity(16));
///
/// let consumer = thread::spawn({
///     let queue = Arc::clone(&queue);
///     move || {
///         let mut sum = 0;
///         while let Ok((_, value)) = queue.pop(true) {
///             sum += value;
///         }
///         sum
///     }
/// });
///
/// for i in 0..10 {
///     while queue.push(i).is_err() {
///         thread::yield_now();
///     }
/// }
/// while !queue.is_empty() {
///     thread::yield_now();
/// }
/// queue.cancel();
///
/// assert_eq!(consumer.join().unwrap(), 45);
/// ```
pub struct BoundedBlockingQueue<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    available: Condvar,
    #[cfg(feature = "metrics")]
    metrics: AtomicMetrics,
}

impl<T> BoundedBlockingQueue<T> {
    /// Create a queue without a practical capacity limit (`usize::MAX`)
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// Create a queue that holds at most `capacity` items
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msgq::BoundedBlockingQueue;
    ///
    /// let queue: BoundedBlockingQueue<u8> = BoundedBlockingQueue::with_capacity(3);
    /// assert_eq!(queue.capacity(), 3);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Queue capacity must be greater than 0");

        Self {
            capacity,
            state: Mutex::new(State {
                items: VecDeque::new(),
                cancelled: false,
            }),
            available: Condvar::new(),
            #[cfg(feature = "metrics")]
            metrics: AtomicMetrics::default(),
        }
    }

    /// Push an item to the tail of the queue
    ///
    /// Never blocks beyond the critical section.
    ///
    /// # Returns
    ///
    /// * `Ok(len)` with the number of queued items after the insertion (at least 1)
    /// * `Err(PushError::Full(item))` if the queue already holds `capacity` items
    /// * `Err(PushError::Cancelled(item))` if the queue has been cancelled
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msgq::{BoundedBlockingQueue, PushError};
    ///
    /// let queue = BoundedBlockingQueue::with_capacity(1);
    /// assert_eq!(queue.push(42), Ok(1));
    /// assert_eq!(queue.push(43), Err(PushError::Full(43)));
    /// ```
    pub fn push(&self, item: T) -> core::result::Result<usize, PushError<T>> {
        let mut state = self.state.lock();

        if state.cancelled {
            drop(state);
            #[cfg(feature = "metrics")]
            self.metrics.record_push_cancelled();
            trace!("push rejected: queue cancelled");
            return Err(PushError::Cancelled(item));
        }

        if state.items.len() >= self.capacity {
            drop(state);
            #[cfg(feature = "metrics")]
            self.metrics.record_full();
            trace!(capacity = self.capacity, "push rejected: queue full");
            return Err(PushError::Full(item));
        }

        state.items.push_back(item);
        let len = state.items.len();
        if len == 1 {
            self.available.notify_one();
        }
        drop(state);

        #[cfg(feature = "metrics")]
        self.metrics.record_push(len);

        Ok(len)
    }

    /// Pop the item at the head of the queue
    ///
    /// With `blocking == false` the call never suspends. With
    /// `blocking == true` the calling thread sleeps until an item arrives or
    /// the queue is cancelled.
    ///
    /// # Returns
    ///
    /// * `Ok((len, item))` where `len` is the number of queued items before
    ///   the extraction (at least 1)
    /// * `Err(Error::Empty)` if non-blocking and nothing is queued
    /// * `Err(Error::Cancelled)` if blocking and the queue has been cancelled,
    ///   or non-blocking and the queue is both cancelled and empty
    ///
    /// # Examples
    ///
    /// ```rust
    /// use msgq::{BoundedBlockingQueue, Error};
    ///
    /// let queue = BoundedBlockingQueue::new();
    /// assert_eq!(queue.pop(false), Err(Error::Empty));
    ///
    /// queue.push('x').unwrap();
    /// queue.push('y').unwrap();
    /// assert_eq!(queue.pop(true), Ok((2, 'x')));
    /// assert_eq!(queue.pop(false), Ok((1, 'y')));
    /// ```
    pub fn pop(&self, blocking: bool) -> Result<(usize, T)> {
        let mut state = self.state.lock();

        if !blocking {
            let popped = self.take_front(&mut state);
            return match popped {
                Some(popped) => {
                    drop(state);
                    #[cfg(feature = "metrics")]
                    self.metrics.record_pop();
                    Ok(popped)
                }
                None if state.cancelled => {
                    drop(state);
                    #[cfg(feature = "metrics")]
                    self.metrics.record_pop_cancelled();
                    Err(Error::Cancelled)
                }
                None => {
                    drop(state);
                    #[cfg(feature = "metrics")]
                    self.metrics.record_empty();
                    Err(Error::Empty)
                }
            };
        }

        // Loop because a wake-up does not imply an item or a cancellation.
        loop {
            if state.cancelled {
                drop(state);
                #[cfg(feature = "metrics")]
                self.metrics.record_pop_cancelled();
                return Err(Error::Cancelled);
            }

            if let Some(popped) = self.take_front(&mut state) {
                drop(state);
                #[cfg(feature = "metrics")]
                self.metrics.record_pop();
                return Ok(popped);
            }

            #[cfg(feature = "metrics")]
            self.metrics.record_wait();
            state = self.available.wait(state);
        }
    }

    /// Non-blocking [`pop`](Self::pop)
    #[inline]
    pub fn try_pop(&self) -> Result<(usize, T)> {
        self.pop(false)
    }

    /// Blocking [`pop`](Self::pop)
    #[inline]
    pub fn pop_blocking(&self) -> Result<(usize, T)> {
        self.pop(true)
    }

    /// Remove the head, passing the wake-up on if items remain.
    fn take_front(&self, state: &mut State<T>) -> Option<(usize, T)> {
        let len = state.items.len();
        let item = state.items.pop_front()?;
        if len > 1 {
            self.available.notify_one();
        }
        Some((len, item))
    }

    /// Cancel the queue, releasing every thread blocked in [`pop`](Self::pop)
    ///
    /// Irreversible. Queued items are kept and stay reachable through
    /// non-blocking pops. Does not wait for the released threads to run.
    /// Calling it more than once has no further effect.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        if !state.cancelled {
            state.cancelled = true;
            debug!(queued = state.items.len(), "queue cancelled");
        }
        self.available.notify_all();
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    /// Number of queued items
    ///
    /// A snapshot; it may be stale by the time the caller looks at it.
    #[doc(alias = "size")]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Returns `true` if nothing is queued right now
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Maximum number of items the queue holds at once
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Default for BoundedBlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> core::fmt::Debug for BoundedBlockingQueue<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BoundedBlockingQueue")
            .field("capacity", &self.capacity)
            .field("len", &state.items.len())
            .field("cancelled", &state.cancelled)
            .finish()
    }
}

#[cfg(feature = "metrics")]
impl<T> MetricsCollector for BoundedBlockingQueue<T> {
    fn metrics(&self) -> QueueMetrics {
        self.metrics.snapshot()
    }

    fn reset_metrics(&self) {
        self.metrics.reset();
    }

    fn set_metrics_enabled(&self, enabled: bool) {
        self.metrics.set_enabled(enabled);
    }

    fn is_metrics_enabled(&self) -> bool {
        self.metrics.is_enabled()
    }
}
