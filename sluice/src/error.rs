//! Error type shared by every queue operation.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QueueError>;

/// Errors reported synchronously by queue construction and queue operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue was configured with a ceiling that cannot hold a single byte.
    #[error("invalid configuration: max_capacity must be at least 2, got {max_capacity}")]
    InvalidConfiguration {
        /// The rejected ceiling.
        max_capacity: usize,
    },
    /// The element can never be admitted, whatever the current occupancy.
    #[error("element of {len} bytes can never fit a queue limited to {max_capacity} bytes")]
    ElementTooLarge {
        /// Encoded length of the rejected element.
        len: usize,
        /// Configured ceiling of the queue.
        max_capacity: usize,
    },
    /// A non-blocking call cannot proceed right now.
    #[error("operation would block")]
    WouldBlock,
    /// A drop asked for more bytes than the queue currently holds.
    #[error("cannot drop {requested} bytes, only {used} queued")]
    Underflow {
        /// Bytes the caller asked to drop.
        requested: usize,
        /// Bytes held by the queue at the time of the call.
        used: usize,
    },
    /// Growing the arena failed; the queue is left exactly as it was.
    #[error("arena allocation failed: {0}")]
    AllocationFailure(#[from] TryReserveError),
}

impl QueueError {
    /// Returns `true` for errors that may succeed if retried later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::WouldBlock | Self::AllocationFailure(_))
    }
}
