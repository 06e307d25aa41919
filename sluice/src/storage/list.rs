//! Discrete-record backend.
//!
//! Each appended element is its own boxed slice, kept in arrival order. A
//! partial read replaces the front record with a copy of its unread tail, so
//! the list never holds more bytes than are queued.

use std::collections::VecDeque;

use super::{Storage, parts_len};
use crate::error::Result;

/// Queue of owned records.
#[derive(Debug, Default)]
pub struct RecordList {
    records: VecDeque<Box<[u8]>>,
    /// Bytes queued across all records.
    used: usize,
}

impl RecordList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: VecDeque::new(),
            used: 0,
        }
    }

    /// Number of records with unconsumed bytes.
    #[must_use]
    pub fn records(&self) -> usize {
        self.records.len()
    }

    fn chunks(&self) -> impl Iterator<Item = &[u8]> {
        self.records.iter().map(|record| &record[..])
    }
}

impl Storage for RecordList {
    fn used(&self) -> usize {
        self.used
    }

    fn capacity(&self) -> usize {
        self.used
    }

    fn append(&mut self, parts: &[&[u8]]) -> Result<()> {
        let len = parts_len(parts);
        if len == 0 {
            return Ok(());
        }

        let mut record = Vec::new();
        record.try_reserve_exact(len)?;
        for part in parts {
            record.extend_from_slice(part);
        }
        self.records.try_reserve(1)?;
        self.records.push_back(record.into_boxed_slice());

        self.used += len;
        Ok(())
    }

    fn copy_front(&self, out: &mut [u8]) -> usize {
        let mut n = 0;
        for chunk in self.chunks() {
            if n == out.len() {
                break;
            }
            let take = chunk.len().min(out.len() - n);
            out[n..n + take].copy_from_slice(&chunk[..take]);
            n += take;
        }
        n
    }

    fn advance(&mut self, mut len: usize) {
        debug_assert!(len <= self.used);
        self.used -= len;

        while len > 0 {
            let Some(front) = self.records.front_mut() else {
                break;
            };
            if len < front.len() {
                *front = Box::from(&front[len..]);
                break;
            }
            len -= front.len();
            self.records.pop_front();
        }
    }

    fn find(&self, byte: u8) -> Option<usize> {
        self.chunks().flatten().position(|&b| b == byte)
    }

    fn reclaim(&mut self, shrink: bool) {
        if self.used == 0 {
            self.records = VecDeque::new();
        } else if shrink {
            self.records.shrink_to_fit();
        }
    }
}
