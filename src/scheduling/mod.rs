//! Update-cycle scheduling core.
//!
//! The system is built around three components:
//! - `FeedQueue`: shared multi-consumer queue of pending feed updates
//! - `WorkerPool`: fork-join pool draining the queue once per cycle
//! - `UpdateRunner`: the cycle workflow (hooks, fetch, dispatch, timing)

pub mod feed_queue;
pub mod runner;
pub mod worker_pool;

pub use feed_queue::FeedQueue;
pub use runner::UpdateRunner;
pub use worker_pool::WorkerPool;
