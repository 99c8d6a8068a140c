//! Transport API for the News server.
//!
//! The scheduling core talks to the server through two capability traits:
//! [`FeedSource`] for the per-cycle hooks and the feed list, and
//! [`FeedUpdater`] for updating a single feed. Two interchangeable
//! implementations exist, one driving the console API through `occ`
//! subprocesses ([`cli::CliUpdater`]) and one driving the HTTP API
//! ([`web::WebUpdater`]); the configuration selects one at startup.

pub mod cli;
pub mod web;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiResult};

pub use cli::CliUpdater;
pub use web::WebUpdater;

/// One unit of update work: a feed and the user owning it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedJob {
    pub feed_id: i64,
    pub user_id: String,
}

impl FeedJob {
    pub fn new(feed_id: i64, user_id: impl Into<String>) -> Self {
        Self {
            feed_id,
            user_id: user_id.into(),
        }
    }
}

/// API level of the News installation being updated.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiLevel {
    /// News releases before 9.0.0
    #[value(name = "v1-2")]
    #[serde(rename = "v1-2")]
    V12,
    /// News 15.0.0 or greater
    #[value(name = "v15")]
    #[serde(rename = "v15")]
    V15,
    /// News 9.0.0 or greater
    #[value(name = "v2")]
    #[serde(rename = "v2")]
    V2,
}

/// Per-cycle operations of the transport: the cleanup hooks and the list of
/// feeds to update. An error from any of these fails the current cycle.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Runs the server's pre-update cleanup.
    async fn before_update(&self) -> ApiResult<()>;

    /// Fetches every (feed, owner) pair that should be updated this cycle.
    /// An empty list is valid.
    async fn all_feeds(&self) -> ApiResult<Vec<FeedJob>>;

    /// Runs the server's post-update cleanup.
    async fn after_update(&self) -> ApiResult<()>;
}

/// Updates a single feed. Called concurrently by the worker pool; a failure
/// only affects the one job it was raised for.
#[async_trait]
pub trait FeedUpdater: Send + Sync {
    async fn update_feed(&self, job: &FeedJob) -> ApiResult<()>;
}

#[derive(Deserialize)]
struct FeedListV12 {
    feeds: Vec<FeedEntryV12>,
}

#[derive(Deserialize)]
struct FeedEntryV12 {
    id: i64,
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Deserialize)]
struct FeedListV2 {
    updater: Vec<FeedEntryV2>,
}

#[derive(Deserialize)]
struct FeedEntryV2 {
    #[serde(rename = "feedId")]
    feed_id: i64,
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Deserialize)]
struct FeedEntryV15 {
    feed_id: i64,
    user_id: String,
}

/// Parses a feed-list payload in the shape of the given API level.
///
/// `v1-2` wraps the entries in a `feeds` array, `v2` in an `updater` array,
/// and the News 15 console API returns a bare snake_case array.
pub fn parse_feed_list(level: ApiLevel, payload: &str) -> ApiResult<Vec<FeedJob>> {
    let parsed = match level {
        ApiLevel::V12 => serde_json::from_str::<FeedListV12>(payload).map(|list| {
            list.feeds
                .into_iter()
                .map(|entry| FeedJob::new(entry.id, entry.user_id))
                .collect()
        }),
        ApiLevel::V2 => serde_json::from_str::<FeedListV2>(payload).map(|list| {
            list.updater
                .into_iter()
                .map(|entry| FeedJob::new(entry.feed_id, entry.user_id))
                .collect()
        }),
        ApiLevel::V15 => serde_json::from_str::<Vec<FeedEntryV15>>(payload).map(|entries| {
            entries
                .into_iter()
                .map(|entry| FeedJob::new(entry.feed_id, entry.user_id))
                .collect()
        }),
    };
    parsed.map_err(|source| ApiError::FeedListJson {
        payload: payload.to_string(),
        source,
    })
}
