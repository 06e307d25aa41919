//! Byte-span queue.
//!
//! Elements are plain byte spans with no framing: the queue only sees a
//! stream of bytes. Reads copy as many bytes as the destination holds and
//! leave the rest queued for the next read.
//!
//! # Example
//!
//! ```
//! use sluice::{ByteQueue, Flags};
//!
//! let queue = ByteQueue::new(16, Flags::SHRINK).unwrap();
//! queue.push(b"hello", Flags::empty()).unwrap();
//!
//! let mut buf = [0u8; 3];
//! assert_eq!(queue.pop(&mut buf, Flags::empty()), 3);
//! assert_eq!(&buf, b"hel");
//! assert_eq!(queue.pop(&mut buf, Flags::empty()), 2);
//! assert_eq!(&buf[..2], b"lo");
//! ```

use std::fmt;

use super::gate::Gate;
use crate::config::{Backend, Flags, QueueConfig};
use crate::error::Result;

/// Bounded, blocking queue of raw bytes.
pub struct ByteQueue {
    gate: Gate,
}

impl ByteQueue {
    /// Creates a ring-backed queue holding at most `max_capacity - 1` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QueueError::InvalidConfiguration`] if `max_capacity < 2`.
    pub fn new(max_capacity: usize, flags: Flags) -> Result<Self> {
        Self::with_config(QueueConfig::new(max_capacity).with_flags(flags))
    }

    /// Creates a queue from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QueueError::InvalidConfiguration`] if the configuration
    /// does not validate.
    pub fn with_config(config: QueueConfig) -> Result<Self> {
        Ok(Self {
            gate: Gate::new(config)?,
        })
    }

    /// Appends `data` to the queue.
    ///
    /// With [`Flags::WAIT`] the call blocks until `data` fits.
    ///
    /// # Errors
    ///
    /// - [`crate::QueueError::ElementTooLarge`] if `data.len() >= max_capacity`,
    ///   with or without waiting.
    /// - [`crate::QueueError::WouldBlock`] if it does not fit now and the call
    ///   must not wait.
    /// - [`crate::QueueError::AllocationFailure`] if the arena cannot grow.
    pub fn push(&self, data: &[u8], flags: Flags) -> Result<()> {
        self.gate.push(&[data], flags)
    }

    /// Moves up to `buf.len()` bytes from the front of the queue into `buf`.
    ///
    /// Returns the number of bytes copied. With [`Flags::WAIT`] the call blocks
    /// while the queue is empty, but never waits for more bytes than are
    /// already queued. Without it, an empty queue yields 0.
    pub fn pop(&self, buf: &mut [u8], flags: Flags) -> usize {
        self.gate
            .pop_with(flags, |storage| {
                let n = storage.copy_front(buf);
                (n, n)
            })
            .unwrap_or(0)
    }

    /// Copies up to `buf.len()` bytes from the front of the queue into `buf`
    /// without removing them.
    pub fn peek(&self, buf: &mut [u8], flags: Flags) -> usize {
        self.gate
            .peek_with(flags, |storage| storage.copy_front(buf))
            .unwrap_or(0)
    }

    /// Drops `len` bytes from the front of the queue without copying them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QueueError::Underflow`] if fewer than `len` bytes are
    /// queued. The queue is left untouched in that case.
    pub fn discard(&self, len: usize) -> Result<()> {
        self.gate.discard(len)
    }

    /// Bytes currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gate.used()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gate.is_empty()
    }

    /// Bytes currently allocated by the storage backend.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.gate.capacity()
    }

    /// Configured ceiling.
    #[must_use]
    pub const fn max_capacity(&self) -> usize {
        self.gate.config().max_capacity
    }

    /// Queue-wide flags.
    #[must_use]
    pub const fn flags(&self) -> Flags {
        self.gate.config().flags
    }

    /// Storage backend in use.
    #[must_use]
    pub const fn backend(&self) -> Backend {
        self.gate.config().backend
    }
}

impl fmt::Debug for ByteQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteQueue")
            .field("config", self.gate.config())
            .field("used", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueueError;

    #[test]
    fn partial_pop_leaves_remainder_queued() {
        let queue = ByteQueue::new(32, Flags::empty()).unwrap();
        queue.push(b"abcdef", Flags::empty()).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(queue.pop(&mut buf, Flags::empty()), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.pop(&mut buf, Flags::WAIT), 2);
        assert_eq!(&buf[..2], b"ef");
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 0);
    }

    #[test]
    fn pushes_concatenate() {
        let queue = ByteQueue::new(32, Flags::empty()).unwrap();
        queue.push(b"ab", Flags::empty()).unwrap();
        queue.push(b"cd", Flags::empty()).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(queue.peek(&mut buf, Flags::empty()), 4);
        assert_eq!(&buf[..4], b"abcd");
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn peek_never_shrinks() {
        let queue = ByteQueue::new(32, Flags::SHRINK).unwrap();
        queue.push(&[7u8; 20], Flags::empty()).unwrap();
        queue.discard(16).unwrap();
        let capacity = queue.capacity();

        let mut buf = [0u8; 2];
        queue.peek(&mut buf, Flags::empty());
        assert_eq!(queue.capacity(), capacity);
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn empty_push_is_accepted_and_holds_nothing() {
        let queue = ByteQueue::new(2, Flags::empty()).unwrap();
        queue.push(b"", Flags::empty()).unwrap();
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 0);
    }

    #[test]
    fn pop_into_empty_buffer_consumes_nothing() {
        let queue = ByteQueue::new(8, Flags::empty()).unwrap();
        queue.push(b"abc", Flags::empty()).unwrap();
        assert_eq!(queue.pop(&mut [], Flags::empty()), 0);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn discard_zero_on_idle_queue() {
        let queue = ByteQueue::new(8, Flags::empty()).unwrap();
        queue.discard(0).unwrap();
        assert_eq!(
            queue.discard(1),
            Err(QueueError::Underflow {
                requested: 1,
                used: 0
            })
        );
    }

    #[test]
    fn accessors_reflect_config() {
        let config = QueueConfig::new(64)
            .with_flags(Flags::SHRINK)
            .with_backend(Backend::List);
        let queue = ByteQueue::with_config(config).unwrap();
        assert_eq!(queue.max_capacity(), 64);
        assert_eq!(queue.flags(), Flags::SHRINK);
        assert_eq!(queue.backend(), Backend::List);
    }
}
