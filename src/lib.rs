//! # msgq
//!
//! A bounded, cancellable, blocking message queue for inter-thread
//! communication, and a small thread pool that dispatches tasks through it.
//!
//! ## Features
//!
//! - **Blocking queue**: FIFO, capacity-limited, one mutex and one condition variable
//! - **Cancellation**: a one-way signal that releases every blocked consumer
//! - **Thread pool**: worker threads fed from an input queue, results collected from an output queue
//! - **Metrics**: optional per-queue operation counters (`metrics` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use msgq::BoundedBlockingQueue;
//!
//! let queue = BoundedBlockingQueue::with_capacity(2);
//! assert_eq!(queue.push("a"), Ok(1));
//! assert_eq!(queue.push("b"), Ok(2));
//! assert!(queue.push("c").is_err());
//!
//! assert_eq!(queue.pop(true), Ok((2, "a")));
//! queue.cancel();
//! assert_eq!(queue.pop(false), Ok((1, "b")));
//! assert_eq!(queue.pop(true), Err(msgq::Error::Cancelled));
//! ```
//!
//! ## Thread Safety
//!
//! Every operation takes `&self`; share a queue between threads with
//! [`std::sync::Arc`]. Only [`BoundedBlockingQueue::pop`] in blocking mode
//! can suspend the calling thread.
//!
//! ## Model checking
//!
//! Building with `RUSTFLAGS="--cfg loom"` swaps the lock primitives for
//! loom's, and `cargo test --lib` then runs the exhaustive interleaving tests
//! in `queue::loom_tests`.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

use core::fmt;

#[cfg(feature = "metrics")]
pub mod metrics;
pub mod pool;
pub mod queue;
pub mod task;

mod sync;

pub use crate::pool::{PoolConfig, ThreadPool};
pub use crate::queue::BoundedBlockingQueue;
pub use crate::task::{Task, TaskFn};

/// Error types for queue operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// The queue holds `capacity` items already
    Full,
    /// Non-blocking pop found nothing to take
    Empty,
    /// The queue has been cancelled
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Full => write!(f, "Queue is full"),
            Error::Empty => write!(f, "Queue is empty"),
            Error::Cancelled => write!(f, "Queue has been cancelled"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type for queue operations
pub type Result<T> = core::result::Result<T, Error>;

/// A rejected push. The item is handed back to the caller untouched.
#[derive(Clone, PartialEq, Eq)]
pub enum PushError<T> {
    /// The queue was at capacity.
    Full(T),
    /// The queue had been cancelled.
    Cancelled(T),
}

impl<T> PushError<T> {
    /// Returns the item that could not be enqueued.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(item) | PushError::Cancelled(item) => item,
        }
    }

    /// The failure without its payload.
    pub fn kind(&self) -> Error {
        match self {
            PushError::Full(_) => Error::Full,
            PushError::Cancelled(_) => Error::Cancelled,
        }
    }

    /// `true` if the push failed because the queue was full.
    pub fn is_full(&self) -> bool {
        matches!(self, PushError::Full(_))
    }

    /// `true` if the push failed because the queue was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PushError::Cancelled(_))
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => f.write_str("Full(..)"),
            PushError::Cancelled(_) => f.write_str("Cancelled(..)"),
        }
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind(), f)
    }
}

impl<T> std::error::Error for PushError<T> {}

impl<T> From<PushError<T>> for Error {
    fn from(err: PushError<T>) -> Self {
        err.kind()
    }
}
