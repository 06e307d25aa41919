//! Byte storage backends behind the blocking queues.
//!
//! A backend owns the queued bytes and knows nothing about locking, waiting or
//! framing. Two implementations exist:
//! - [`RingArena`] - a packed circular arena that grows to exactly what is
//!   needed, shrinks on demand and is released whenever it drains.
//! - [`RecordList`] - one owned allocation per pushed element. It has no
//!   wrap or resize arithmetic and serves as the reference the arena is
//!   checked against.
//!
//! The concrete backend is picked at runtime from [`Backend`].

mod list;
mod ring;

use std::fmt;

pub use list::RecordList;
pub use ring::RingArena;

use crate::config::Backend;
use crate::error::Result;

/// Storage contract shared by every backend.
///
/// All methods are called with the queue lock held. Callers uphold the
/// capacity ceiling themselves: by the time [`Storage::append`] runs the queue
/// has already verified the bytes fit under `max_capacity`.
pub trait Storage: Send + fmt::Debug {
    /// Bytes currently queued.
    fn used(&self) -> usize;

    /// Bytes currently allocated for queued data. Zero when idle.
    fn capacity(&self) -> usize;

    /// Returns `true` when nothing is queued.
    fn is_empty(&self) -> bool {
        self.used() == 0
    }

    /// Appends the concatenation of `parts` as one element.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QueueError::AllocationFailure`] if the backend cannot
    /// allocate room for the element. Nothing is written in that case.
    fn append(&mut self, parts: &[&[u8]]) -> Result<()>;

    /// Copies queued bytes from the front into `out` without consuming them.
    ///
    /// Returns the number of bytes copied: `min(out.len(), self.used())`.
    fn copy_front(&self, out: &mut [u8]) -> usize;

    /// Discards `len` bytes from the front. `len` must not exceed [`Storage::used`].
    fn advance(&mut self, len: usize);

    /// Offset from the front of the first occurrence of `byte`, if any.
    fn find(&self, byte: u8) -> Option<usize>;

    /// Returns memory after a removal: everything when empty, half the
    /// allocation when `shrink` is set and less than half is in use.
    fn reclaim(&mut self, shrink: bool);
}

impl Backend {
    /// Builds an empty, unallocated backend of this kind.
    #[must_use]
    pub fn build(self) -> Box<dyn Storage> {
        match self {
            Self::Ring => Box::new(RingArena::new()),
            Self::List => Box::new(RecordList::new()),
        }
    }
}

/// Total length of an element made of `parts`.
pub(crate) fn parts_len(parts: &[&[u8]]) -> usize {
    parts.iter().map(|part| part.len()).sum()
}
