//! Blocking queues for handing data between threads.
//!
//! Both queue types serialize every call on one mutex and park callers on two
//! condition variables, one for "data arrived" and one for "space freed":
//! - [`ByteQueue`] - raw byte spans; reads may return part of what was pushed.
//! - [`RecordQueue`] - NUL-terminated records; reads always consume a whole record.
//!
//! Share a queue between threads with an [`std::sync::Arc`].

pub mod bytes;
mod gate;
pub mod record;

pub use bytes::ByteQueue;
pub use record::{RecordQueue, TERMINATOR};
