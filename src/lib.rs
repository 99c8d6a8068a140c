//! Parallel feed updater for the News app.
//!
//! Fetches the list of (feed, owner) pairs from a News installation and
//! dispatches one update per feed across a bounded pool of workers, once or
//! on a fixed interval. The server is driven either through its console API
//! (`occ` subprocesses) or its HTTP API; both sit behind the capability
//! traits in [`api`] and are selected by the configuration at startup.

pub mod api;
pub mod config;
pub mod errors;
pub mod scheduling;
