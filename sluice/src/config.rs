//! Queue configuration: capacity ceiling, behavior flags and storage backend.

use serde::{Deserialize, Serialize};

use crate::error::{QueueError, Result};

/// Smallest usable ceiling. One byte of storage is always kept free, so a
/// queue of two bytes can hold exactly one.
pub const MIN_CAPACITY: usize = 2;

/// Ceiling used by [`QueueConfig::default`].
pub const DEFAULT_MAX_CAPACITY: usize = 4096;

bitflags::bitflags! {
    /// Behavior flags.
    ///
    /// `WAIT` may be passed per call or set queue-wide at construction, in
    /// which case every call waits. `SHRINK` is only honored at construction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Flags: u32 {
        /// Block a push while the queue is full, or a pop/peek while it is empty.
        const WAIT = 1;
        /// Halve the arena after a removal leaves less than half of it in use.
        const SHRINK = 2;
    }
}

/// Storage strategy selected when a queue is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Packed, resizable circular arena.
    #[default]
    Ring,
    /// One owned allocation per pushed element. Reference implementation.
    List,
}

/// Configuration for a queue.
///
/// # Example
///
/// ```
/// use sluice::{Backend, Flags, QueueConfig};
///
/// let config = QueueConfig::new(64)
///     .with_flags(Flags::SHRINK)
///     .with_backend(Backend::List);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Ceiling for the arena, in bytes. A single element must be strictly smaller.
    pub max_capacity: usize,
    /// Queue-wide flags.
    pub flags: Flags,
    /// Storage strategy.
    pub backend: Backend,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_MAX_CAPACITY,
            flags: Flags::SHRINK,
            backend: Backend::Ring,
        }
    }
}

impl QueueConfig {
    /// Creates a ring-backed configuration with no flags set.
    #[must_use]
    pub const fn new(max_capacity: usize) -> Self {
        Self {
            max_capacity,
            flags: Flags::empty(),
            backend: Backend::Ring,
        }
    }

    /// Replaces the queue-wide flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Selects the storage backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Checks the configuration before a queue is built from it.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConfiguration`] if `max_capacity < 2`.
    pub fn validate(&self) -> Result<()> {
        if self.max_capacity < MIN_CAPACITY {
            return Err(QueueError::InvalidConfiguration {
                max_capacity: self.max_capacity,
            });
        }
        Ok(())
    }

    /// Largest element (in encoded bytes) the queue can ever admit.
    #[must_use]
    pub const fn max_element(&self) -> usize {
        self.max_capacity.saturating_sub(1)
    }
}
