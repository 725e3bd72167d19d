//! Queue implementations
//!
//! ## Available Queues
//!
//! - [`BoundedBlockingQueue`]: multi-producer, multi-consumer FIFO with blocking pop and cancellation
//!
//! ## Operations
//!
//! | Operation | Blocks | Failure |
//! |-----------|--------|---------|
//! | `push` | never | `PushError::Full`, `PushError::Cancelled` |
//! | `pop(false)` | never | `Error::Empty`, `Error::Cancelled` |
//! | `pop(true)` | while empty and not cancelled | `Error::Cancelled` |
//! | `cancel` | never | - |
//! | `len`, `is_cancelled` | never | - |
//!
//! All state sits behind one mutex per queue; there are no lock-free fast
//! paths. This is a coordination primitive, not a high-throughput data path.
pub mod blocking;

pub use blocking::BoundedBlockingQueue;


#[cfg(all(test, not(loom)))]
mod proptests;
