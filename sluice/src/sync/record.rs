//! NUL-terminated record queue.
//!
//! A record is the pushed bytes up to their first NUL, stored with a NUL
//! appended, so each record costs its length plus one byte of capacity.
//! Records are atomic on the way out: a read always consumes exactly one
//! whole record. If the destination is too short the copy is truncated and
//! the rest of that record is lost. This differs from [`super::ByteQueue`],
//! which keeps unread bytes queued.
//!
//! # Example
//!
//! ```
//! use sluice::{Flags, RecordQueue};
//!
//! let queue = RecordQueue::new(64, Flags::empty()).unwrap();
//! queue.push(b"first", Flags::empty()).unwrap();
//! queue.push(b"second", Flags::empty()).unwrap();
//!
//! let mut buf = [0u8; 4];
//! assert_eq!(queue.pop(&mut buf, Flags::empty()), 4);
//! assert_eq!(&buf, b"fir\0");
//! assert_eq!(queue.pop_record(Flags::empty()).as_deref(), Some(&b"second"[..]));
//! ```

use std::fmt;

use super::gate::Gate;
use crate::config::{Backend, Flags, QueueConfig};
use crate::error::Result;
use crate::storage::Storage;

/// Byte that ends every stored record.
pub const TERMINATOR: u8 = 0;

/// Bounded, blocking queue of NUL-terminated records.
pub struct RecordQueue {
    gate: Gate,
}

/// Stored length of the front record, terminator included.
fn front_record_len(storage: &dyn Storage) -> usize {
    storage
        .find(TERMINATOR)
        .map_or_else(|| storage.used(), |end| end + 1)
}

/// Copies the front record into `buf`, truncating it and always ending the
/// copy with a terminator. Returns `(bytes written, bytes to consume)`.
fn copy_record(storage: &dyn Storage, buf: &mut [u8]) -> (usize, usize) {
    let record = front_record_len(storage);
    let len = record.min(buf.len());
    let n = storage.copy_front(&mut buf[..len]);
    if let Some(last) = buf[..n].last_mut() {
        *last = TERMINATOR;
    }
    (n, record)
}

impl RecordQueue {
    /// Creates a ring-backed record queue.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QueueError::InvalidConfiguration`] if `max_capacity < 2`.
    pub fn new(max_capacity: usize, flags: Flags) -> Result<Self> {
        Self::with_config(QueueConfig::new(max_capacity).with_flags(flags))
    }

    /// Creates a record queue from a full configuration.
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

    /// Appends one record: `record` up to its first NUL, or all of it.
    ///
    /// The record occupies its length plus one terminator byte.
    ///
    /// # Errors
    ///
    /// - [`crate::QueueError::ElementTooLarge`] if the terminated record is not
    ///   smaller than `max_capacity`.
    /// - [`crate::QueueError::WouldBlock`] if it does not fit now and the call
    ///   must not wait.
    /// - [`crate::QueueError::AllocationFailure`] if the arena cannot grow.
    pub fn push(&self, record: &[u8], flags: Flags) -> Result<()> {
        let payload = match record.iter().position(|&b| b == TERMINATOR) {
            Some(end) => &record[..end],
            None => record,
        };
        self.gate.push(&[payload, &[TERMINATOR]], flags)
    }

    /// Appends a string record. See [`RecordQueue::push`].
    ///
    /// # Errors
    ///
    /// Same as [`RecordQueue::push`].
    pub fn push_str(&self, record: &str, flags: Flags) -> Result<()> {
        self.push(record.as_bytes(), flags)
    }

    /// Removes the front record and copies it into `buf`.
    ///
    /// At most `buf.len()` bytes are written and the last one written is
    /// always a terminator. The whole record is consumed even when it did not
    /// fit. Returns the number of bytes written, terminator included; 0 means
    /// nothing was queued (without [`Flags::WAIT`]) or `buf` is empty.
    pub fn pop(&self, buf: &mut [u8], flags: Flags) -> usize {
        self.gate
            .pop_with(flags, |storage| copy_record(storage, buf))
            .unwrap_or(0)
    }

    /// Copies the front record into `buf` like [`RecordQueue::pop`], but leaves
    /// it queued.
    pub fn peek(&self, buf: &mut [u8], flags: Flags) -> usize {
        self.gate
            .peek_with(flags, |storage| copy_record(storage, buf).0)
            .unwrap_or(0)
    }

    /// Removes the front record and returns it whole, without its terminator.
    ///
    /// Returns `None` if the queue is empty and the call must not wait.
    #[must_use]
    pub fn pop_record(&self, flags: Flags) -> Option<Vec<u8>> {
        self.gate.pop_with(flags, |storage| {
            let record = front_record_len(storage);
            let mut out = vec![0u8; record];
            storage.copy_front(&mut out);
            out.pop();
            (out, record)
        })
    }

    /// Bytes currently queued, terminators included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gate.used()
    }

    /// Returns `true` if no record is queued.
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

impl fmt::Debug for RecordQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordQueue")
            .field("config", self.gate.config())
            .field("used", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
