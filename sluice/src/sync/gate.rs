//! Lock and wait protocol shared by the framed queues.
//!
//! The gate owns the storage backend behind a single mutex. Producers wait on
//! `popped` until their element fits under the ceiling, consumers wait on
//! `pushed` until something is queued. Every wait re-checks its predicate, so
//! spurious wakeups and lost races only cost another sleep.

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::config::{Flags, QueueConfig};
use crate::error::{QueueError, Result};
use crate::storage::{Storage, parts_len};
use crate::trace::{debug, trace};

type Guard<'a> = MutexGuard<'a, Box<dyn Storage>>;

pub(crate) struct Gate {
    storage: Mutex<Box<dyn Storage>>,
    /// Signalled after an insertion: the queue is not empty.
    pushed: Condvar,
    /// Signalled after a removal: the queue may have room.
    popped: Condvar,
    config: QueueConfig,
}

impl Gate {
    pub(crate) fn new(config: QueueConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            max_capacity = config.max_capacity,
            flags = ?config.flags,
            backend = ?config.backend,
            "queue created"
        );

        Ok(Self {
            storage: Mutex::new(config.backend.build()),
            pushed: Condvar::new(),
            popped: Condvar::new(),
            config,
        })
    }

    pub(crate) const fn config(&self) -> &QueueConfig {
        &self.config
    }

    fn waits(&self, flags: Flags) -> bool {
        (flags | self.config.flags).contains(Flags::WAIT)
    }

    /// Appends `parts` as one element once it fits under the ceiling.
    pub(crate) fn push(&self, parts: &[&[u8]], flags: Flags) -> Result<()> {
        let len = parts_len(parts);
        let max_capacity = self.config.max_capacity;
        if len >= max_capacity {
            debug!(len, max_capacity, "element can never fit");
            return Err(QueueError::ElementTooLarge { len, max_capacity });
        }

        let mut storage = self.storage.lock();
        if len + storage.used() >= max_capacity {
            if !self.waits(flags) {
                return Err(QueueError::WouldBlock);
            }
            trace!(len, "producer waiting for space");
            while len + storage.used() >= max_capacity {
                self.popped.wait(&mut storage);
            }
            trace!(len, "producer resumed");
        }

        storage.append(parts)?;
        self.pushed.notify_one();
        Ok(())
    }

    /// Runs `read` on the front of the queue without consuming anything.
    pub(crate) fn peek_with<R>(&self, flags: Flags, read: impl FnOnce(&dyn Storage) -> R) -> Option<R> {
        let storage = self.lock_readable(flags)?;
        let out = read(&**storage);
        // The data is still there for the next waiting consumer.
        self.pushed.notify_one();
        Some(out)
    }

    /// Runs `read` on the front of the queue and consumes the byte count it
    /// returns, all under one lock hold.
    pub(crate) fn pop_with<R>(
        &self,
        flags: Flags,
        read: impl FnOnce(&dyn Storage) -> (R, usize),
    ) -> Option<R> {
        let mut storage = self.lock_readable(flags)?;
        let (out, consumed) = read(&**storage);
        self.release(&mut storage, consumed);
        Some(out)
    }

    /// Consumes `len` bytes from the front without copying them.
    pub(crate) fn discard(&self, len: usize) -> Result<()> {
        let mut storage = self.storage.lock();
        let used = storage.used();
        if len > used {
            return Err(QueueError::Underflow {
                requested: len,
                used,
            });
        }
        self.release(&mut storage, len);
        Ok(())
    }

    pub(crate) fn used(&self) -> usize {
        self.storage.lock().used()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.storage.lock().capacity()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.storage.lock().is_empty()
    }

    /// Locks the storage once it holds data, or returns `None` right away if
    /// it is empty and the call must not wait.
    fn lock_readable(&self, flags: Flags) -> Option<Guard<'_>> {
        let mut storage = self.storage.lock();
        if storage.is_empty() {
            if !self.waits(flags) {
                return None;
            }
            trace!("consumer waiting for data");
            while storage.is_empty() {
                self.pushed.wait(&mut storage);
            }
            trace!(used = storage.used(), "consumer resumed");
        }
        Some(storage)
    }

    fn release(&self, storage: &mut Guard<'_>, len: usize) {
        storage.advance(len);
        storage.reclaim(self.config.flags.contains(Flags::SHRINK));
        self.popped.notify_one();
        if !storage.is_empty() {
            self.pushed.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::config::Backend;

    fn gate(max_capacity: usize, flags: Flags) -> Gate {
        Gate::new(QueueConfig::new(max_capacity).with_flags(flags)).unwrap()
    }

    #[test]
    fn rejects_invalid_ceiling() {
        assert!(matches!(
            Gate::new(QueueConfig::new(1)),
            Err(QueueError::InvalidConfiguration { max_capacity: 1 })
        ));
    }

    #[test]
    fn oversized_elements_fail_even_when_waiting() {
        let gate = gate(4, Flags::WAIT);
        assert_eq!(
            gate.push(&[b"abcd"], Flags::WAIT),
            Err(QueueError::ElementTooLarge {
                len: 4,
                max_capacity: 4
            })
        );
        assert!(gate.is_empty());
    }

    #[test]
    fn full_queue_would_block() {
        let gate = gate(4, Flags::empty());
        gate.push(&[b"abc"], Flags::empty()).unwrap();
        assert_eq!(gate.push(&[b"d"], Flags::empty()), Err(QueueError::WouldBlock));
        assert_eq!(gate.used(), 3);
    }

    #[test]
    fn empty_queue_reads_nothing_without_wait() {
        let gate = gate(4, Flags::empty());
        assert_eq!(gate.peek_with(Flags::empty(), |s| s.used()), None);
        assert_eq!(gate.pop_with(Flags::empty(), |s| (s.used(), 0)), None);
    }

    #[test]
    fn discard_beyond_usage_leaves_state_alone() {
        let gate = gate(8, Flags::empty());
        gate.push(&[b"abc"], Flags::empty()).unwrap();
        assert_eq!(
            gate.discard(4),
            Err(QueueError::Underflow {
                requested: 4,
                used: 3
            })
        );
        assert_eq!(gate.used(), 3);
        gate.discard(3).unwrap();
        assert_eq!(gate.capacity(), 0);
    }

    #[test]
    fn queue_wide_wait_applies_to_every_call() {
        let gate = Arc::new(gate(4, Flags::WAIT));
        let reader = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.pop_with(Flags::empty(), |s| (s.used(), s.used())))
        };

        thread::sleep(Duration::from_millis(20));
        gate.push(&[b"ab"], Flags::empty()).unwrap();
        assert_eq!(reader.join().unwrap(), Some(2));
    }

    #[test]
    fn blocked_producer_resumes_after_removal() {
        let gate = Arc::new(gate(4, Flags::empty()));
        gate.push(&[b"abc"], Flags::empty()).unwrap();

        let producer = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.push(&[b"xy"], Flags::WAIT))
        };

        thread::sleep(Duration::from_millis(20));
        assert_eq!(gate.used(), 3, "producer must still be parked");
        gate.discard(3).unwrap();

        producer.join().unwrap().unwrap();
        assert_eq!(gate.used(), 2);
    }

    #[test]
    fn peek_passes_the_wakeup_on() {
        let gate = Arc::new(
            Gate::new(QueueConfig::new(16).with_backend(Backend::List)).unwrap(),
        );
        let peeker = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.peek_with(Flags::WAIT, |s| s.used()))
        };
        let popper = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.pop_with(Flags::WAIT, |s| (s.used(), s.used())))
        };

        thread::sleep(Duration::from_millis(20));
        gate.push(&[b"abcd"], Flags::empty()).unwrap();

        assert_eq!(popper.join().unwrap(), Some(4));
        // The peeker either saw the data before the pop or is still parked.
        if !peeker.is_finished() {
            gate.push(&[b"ef"], Flags::empty()).unwrap();
        }
        assert!(peeker.join().unwrap().is_some());
    }
}
