//! Resizable circular byte arena.
//!
//! The arena is a `Vec<u8>` whose length is the current capacity, plus two
//! offsets into it:
//!
//! ```text
//!  contiguous:   [ . . . H # # # # T . . . ]
//!  wrapped:      [ # # T . . . . . H # # # ]
//! ```
//!
//! `head` is the first queued byte and `tail` the first free one. One byte is
//! always left free, so `head == tail` means empty and never full.
//!
//! Capacity tracks demand exactly: an append that does not fit grows the arena
//! to `used + len + 1`, a drained arena is released entirely, and with
//! shrinking enabled an arena less than half used is halved.

use super::{Storage, parts_len};
use crate::error::Result;
use crate::trace::trace;

/// Packed ring buffer backend.
#[derive(Debug, Default)]
pub struct RingArena {
    /// Backing bytes; `buf.len()` is the capacity.
    buf: Vec<u8>,
    /// Offset of the first queued byte.
    head: usize,
    /// Offset of the first free byte.
    tail: usize,
}

impl RingArena {
    /// Creates an unallocated arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            head: 0,
            tail: 0,
        }
    }

    /// Current head and tail offsets.
    #[must_use]
    pub const fn offsets(&self) -> (usize, usize) {
        (self.head, self.tail)
    }

    /// Returns `true` if the queued bytes cross the end of the arena.
    #[must_use]
    pub const fn is_wrapped(&self) -> bool {
        self.tail < self.head
    }

    /// Queued bytes as two slices in logical order. The second is empty unless
    /// the data wraps.
    #[must_use]
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        if self.is_wrapped() {
            (&self.buf[self.head..], &self.buf[..self.tail])
        } else {
            (&self.buf[self.head..self.tail], &[])
        }
    }

    /// Extends the arena to `new_capacity` bytes, keeping the queued bytes in
    /// order.
    ///
    /// When the data wraps, the prefix `[0, tail)` is moved into the new room
    /// after the old end. If it is longer than the room, the part that does not
    /// fit slides down to offset 0.
    fn grow(&mut self, new_capacity: usize) -> Result<()> {
        let old_capacity = self.buf.len();
        debug_assert!(new_capacity > old_capacity);

        let growth = new_capacity - old_capacity;
        self.buf.try_reserve_exact(growth)?;
        self.buf.resize(new_capacity, 0);

        if self.is_wrapped() {
            let wrapped = self.tail;
            if wrapped <= growth {
                self.buf.copy_within(..wrapped, old_capacity);
                self.tail = (old_capacity + wrapped) % new_capacity;
            } else {
                self.buf.copy_within(..growth, old_capacity);
                self.buf.copy_within(growth..wrapped, 0);
                self.tail -= growth;
            }
        }

        trace!(
            from = old_capacity,
            to = new_capacity,
            head = self.head,
            tail = self.tail,
            "arena grown"
        );
        Ok(())
    }

    /// Compacts the queued bytes below `new_capacity` and truncates the arena.
    ///
    /// Requires `used < new_capacity <= capacity`.
    fn shrink(&mut self, new_capacity: usize) {
        let old_capacity = self.buf.len();
        debug_assert!(self.used() < new_capacity && new_capacity <= old_capacity);

        if self.is_wrapped() {
            // Slide the run that ends at the old boundary down to the new one.
            let new_head = self.head - (old_capacity - new_capacity);
            self.buf.copy_within(self.head..old_capacity, new_head);
            self.head = new_head;
        } else if new_capacity <= self.head {
            // Entirely past the boundary: move to the front.
            self.buf.copy_within(self.head..self.tail, 0);
            self.tail -= self.head;
            self.head = 0;
        } else if new_capacity <= self.tail {
            // Straddling the boundary: the part past it becomes the wrapped prefix.
            let spill = self.tail - new_capacity;
            self.buf.copy_within(new_capacity..self.tail, 0);
            self.tail = spill;
        }

        self.buf.truncate(new_capacity);
        self.buf.shrink_to_fit();

        trace!(
            from = old_capacity,
            to = new_capacity,
            head = self.head,
            tail = self.tail,
            "arena shrunk"
        );
    }

    /// Releases the arena and resets the offsets.
    fn trim(&mut self) {
        trace!(capacity = self.buf.len(), "arena trimmed");
        self.buf = Vec::new();
        self.head = 0;
        self.tail = 0;
    }
}

impl Storage for RingArena {
    fn used(&self) -> usize {
        let capacity = self.buf.len();
        if capacity == 0 {
            0
        } else {
            (self.tail + capacity - self.head) % capacity
        }
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    fn append(&mut self, parts: &[&[u8]]) -> Result<()> {
        let len = parts_len(parts);
        if len == 0 {
            return Ok(());
        }

        let used = self.used();
        if len + used >= self.buf.len() {
            self.grow(len + used + 1)?;
        }

        let capacity = self.buf.len();
        for part in parts {
            let first = part.len().min(capacity - self.tail);
            self.buf[self.tail..self.tail + first].copy_from_slice(&part[..first]);
            self.buf[..part.len() - first].copy_from_slice(&part[first..]);
            self.tail = (self.tail + part.len()) % capacity;
        }
        Ok(())
    }

    fn copy_front(&self, out: &mut [u8]) -> usize {
        let (front, back) = self.as_slices();
        let n = out.len().min(front.len() + back.len());
        let first = n.min(front.len());
        out[..first].copy_from_slice(&front[..first]);
        out[first..n].copy_from_slice(&back[..n - first]);
        n
    }

    fn advance(&mut self, len: usize) {
        debug_assert!(len <= self.used());
        if len > 0 {
            self.head = (self.head + len) % self.buf.len();
        }
    }

    fn find(&self, byte: u8) -> Option<usize> {
        let (front, back) = self.as_slices();
        front.iter().chain(back).position(|&b| b == byte)
    }

    fn reclaim(&mut self, shrink: bool) {
        if self.is_empty() {
            if !self.buf.is_empty() {
                self.trim();
            }
        } else if shrink && self.used() < self.buf.len() / 2 {
            self.shrink(self.buf.len() / 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueueError;

    /// Builds an arena of `capacity` bytes holding `data` starting at `head`.
    fn arena_at(capacity: usize, head: usize, data: &[u8]) -> RingArena {
        assert!(data.len() < capacity);
        let mut buf = vec![b'.'; capacity];
        for (i, &b) in data.iter().enumerate() {
            buf[(head + i) % capacity] = b;
        }
        RingArena {
            buf,
            head,
            tail: (head + data.len()) % capacity,
        }
    }

    fn contents(arena: &RingArena) -> Vec<u8> {
        let (front, back) = arena.as_slices();
        [front, back].concat()
    }

    #[test]
    fn first_append_allocates_exactly() {
        let mut arena = RingArena::new();
        assert_eq!(arena.capacity(), 0);

        arena.append(&[b"abc"]).unwrap();
        assert_eq!(arena.capacity(), 4);
        assert_eq!(arena.used(), 3);
        assert_eq!(arena.offsets(), (0, 3));
    }

    #[test]
    fn failed_grow_leaves_arena_untouched() {
        let mut arena = arena_at(8, 6, b"abcd");
        assert!(arena.is_wrapped());

        let err = arena.grow(usize::MAX).unwrap_err();
        assert!(matches!(err, QueueError::AllocationFailure(_)));
        assert!(err.is_transient());
        assert_eq!(arena.capacity(), 8);
        assert_eq!(arena.offsets(), (6, 2));
        assert_eq!(contents(&arena), b"abcd");

        arena.append(&[b"ef"]).unwrap();
        assert_eq!(contents(&arena), b"abcdef");
    }

    #[test]
    fn empty_append_allocates_nothing() {
        let mut arena = RingArena::new();
        arena.append(&[b""]).unwrap();
        assert_eq!(arena.capacity(), 0);
        assert!(arena.is_empty());
    }

    #[test]
    fn append_within_capacity_does_not_grow() {
        let mut arena = arena_at(8, 2, b"ab");
        arena.append(&[b"cde"]).unwrap();
        assert_eq!(arena.capacity(), 8);
        assert_eq!(contents(&arena), b"abcde");
    }

    #[test]
    fn append_wraps_around_the_end() {
        let mut arena = arena_at(8, 5, b"ab");
        arena.append(&[b"cdef"]).unwrap();
        assert_eq!(arena.capacity(), 8);
        assert!(arena.is_wrapped());
        assert_eq!(arena.offsets(), (5, 3));
        assert_eq!(contents(&arena), b"abcdef");
    }

    #[test]
    fn grow_relocates_short_wrapped_prefix() {
        // Data "abcde" with "de" wrapped to the front.
        let mut arena = arena_at(6, 3, b"abcde");
        assert_eq!(arena.offsets(), (3, 2));

        // 5 used + 3 new needs 9 bytes: growth of 3 absorbs the 2 wrapped bytes.
        arena.append(&[b"fgh"]).unwrap();
        assert_eq!(arena.capacity(), 9);
        assert_eq!(contents(&arena), b"abcdefgh");
        assert_eq!(arena.offsets(), (3, 2));
    }

    #[test]
    fn grow_relocates_wrapped_prefix_exactly_filling_room() {
        let mut arena = arena_at(6, 3, b"abcde");
        arena.grow(8).unwrap();
        assert_eq!(arena.offsets(), (3, 0));
        assert_eq!(contents(&arena), b"abcde");
    }

    #[test]
    fn grow_splits_long_wrapped_prefix() {
        // Head near the end, four wrapped bytes "cdef" at the front.
        let mut arena = arena_at(8, 6, b"abcdef");
        assert_eq!(arena.offsets(), (6, 4));

        arena.grow(10).unwrap();
        assert_eq!(arena.capacity(), 10);
        assert_eq!(arena.offsets(), (6, 2));
        assert_eq!(contents(&arena), b"abcdef");
    }

    #[test]
    fn grow_with_tail_at_zero_moves_tail_to_old_end() {
        let mut arena = arena_at(6, 2, b"abcd");
        assert_eq!(arena.offsets(), (2, 0));

        arena.grow(9).unwrap();
        assert_eq!(arena.offsets(), (2, 6));
        assert_eq!(contents(&arena), b"abcd");
    }

    #[test]
    fn shrink_moves_chunk_past_boundary_to_front() {
        let mut arena = arena_at(16, 10, b"xyz");
        arena.shrink(8);
        assert_eq!(arena.capacity(), 8);
        assert_eq!(arena.offsets(), (0, 3));
        assert_eq!(contents(&arena), b"xyz");
    }

    #[test]
    fn shrink_splits_straddling_chunk() {
        let mut arena = arena_at(16, 6, b"abcdef");
        arena.shrink(8);
        assert_eq!(arena.capacity(), 8);
        assert_eq!(arena.offsets(), (6, 4));
        assert_eq!(contents(&arena), b"abcdef");
    }

    #[test]
    fn shrink_keeps_chunk_left_of_boundary() {
        let mut arena = arena_at(16, 1, b"abc");
        arena.shrink(8);
        assert_eq!(arena.offsets(), (1, 4));
        assert_eq!(contents(&arena), b"abc");
    }

    #[test]
    fn shrink_chunk_ending_on_boundary_wraps_tail() {
        let mut arena = arena_at(16, 5, b"abc");
        arena.shrink(8);
        assert_eq!(arena.offsets(), (5, 0));
        assert_eq!(contents(&arena), b"abc");
    }

    #[test]
    fn shrink_slides_wrapped_head_down() {
        let mut arena = arena_at(16, 14, b"abcdef");
        assert_eq!(arena.offsets(), (14, 4));

        arena.shrink(8);
        assert_eq!(arena.offsets(), (6, 4));
        assert_eq!(contents(&arena), b"abcdef");
    }

    #[test]
    fn shrink_wrapped_run_fills_new_arena() {
        // Head run [12, 16) lands on [4, 8), the wrapped prefix stays put.
        let mut arena = arena_at(16, 12, b"abcdefg");
        arena.shrink(8);
        assert_eq!(arena.offsets(), (4, 3));
        assert_eq!(contents(&arena), b"abcdefg");
    }

    #[test]
    fn reclaim_trims_when_drained() {
        let mut arena = RingArena::new();
        arena.append(&[b"abcd"]).unwrap();
        arena.advance(4);
        arena.reclaim(false);
        assert_eq!(arena.capacity(), 0);
        assert_eq!(arena.offsets(), (0, 0));
    }

    #[test]
    fn reclaim_halves_only_when_asked() {
        let mut arena = arena_at(16, 0, b"abcdefghij");
        arena.advance(8);
        arena.reclaim(false);
        assert_eq!(arena.capacity(), 16);

        arena.reclaim(true);
        assert_eq!(arena.capacity(), 8);
        assert_eq!(contents(&arena), b"ij");
    }

    #[test]
    fn reclaim_rounding_at_small_capacities() {
        // 1 < 3 / 2 is false: a 3-byte arena holding one byte stays put.
        let mut arena = arena_at(3, 0, b"ab");
        arena.advance(1);
        arena.reclaim(true);
        assert_eq!(arena.capacity(), 3);

        // 1 < 5 / 2 holds: a 5-byte arena holding one byte halves to 2.
        let mut arena = arena_at(5, 3, b"abc");
        arena.advance(2);
        arena.reclaim(true);
        assert_eq!(arena.capacity(), 2);
        assert_eq!(contents(&arena), b"c");
    }

    #[test]
    fn copy_front_reads_across_the_wrap() {
        let arena = arena_at(8, 6, b"abcdef");
        let mut out = [0u8; 4];
        assert_eq!(arena.copy_front(&mut out), 4);
        assert_eq!(&out, b"abcd");

        let mut out = [0u8; 16];
        assert_eq!(arena.copy_front(&mut out), 6);
        assert_eq!(&out[..6], b"abcdef");
    }

    #[test]
    fn find_sees_wrapped_bytes() {
        let arena = arena_at(8, 6, b"ab\0def");
        assert_eq!(arena.find(0), Some(2));
        assert_eq!(arena.find(b'f'), Some(5));
        assert_eq!(arena.find(b'z'), None);
    }
}
