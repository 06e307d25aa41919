//! Bounded, blocking producer/consumer queues for bytes and records.
//!
//! A queue hands data between threads without unbounded memory growth:
//! producers block (or fail fast) while it is full, consumers block (or fail
//! fast) while it is empty. Storage is allocated on demand, sized to what is
//! actually queued, and released as soon as the queue drains.
//!
//! - [`ByteQueue`] - raw byte spans, partial reads.
//! - [`RecordQueue`] - NUL-terminated records, whole-record reads.
//!
//! Both run over a [`storage::Storage`] backend picked at construction: the
//! packed [`storage::RingArena`] or the one-allocation-per-element
//! [`storage::RecordList`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use sluice::{Flags, RecordQueue};
//!
//! let queue = Arc::new(RecordQueue::new(64, Flags::SHRINK).unwrap());
//!
//! let producer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         for line in ["alpha", "beta", "gamma"] {
//!             queue.push_str(line, Flags::WAIT).unwrap();
//!         }
//!     })
//! };
//!
//! for expected in ["alpha", "beta", "gamma"] {
//!     let record = queue.pop_record(Flags::WAIT).unwrap();
//!     assert_eq!(record, expected.as_bytes());
//! }
//! producer.join().unwrap();
//! assert_eq!(queue.capacity(), 0);
//! ```

pub mod config;
pub mod error;
pub mod storage;
pub mod sync;
mod trace;

#[doc(inline)]
pub use config::{Backend, Flags, QueueConfig};
#[doc(inline)]
pub use error::{QueueError, Result};
#[doc(inline)]
pub use sync::{ByteQueue, RecordQueue};
pub use trace::{init_tracing, try_init_tracing};
