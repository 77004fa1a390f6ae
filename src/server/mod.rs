//! Request dispatch: wiring the command stream to the feed.
//!
//! Two drivers share one processing routine: the sequential driver
//! handles each record on the calling thread; the parallel driver feeds
//! a lock-free queue from a producer and drains it with a pool of
//! consumer threads, with a mutex + condition variable handshake for
//! sleeping and shutdown.

mod codec;
mod dispatch;

pub use codec::{RequestReader, ResponseWriter};
pub use dispatch::run;
