//! Console transport: drives the News `occ` updater commands as
//! subprocesses of a local installation.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use super::{parse_feed_list, ApiLevel, FeedJob, FeedSource, FeedUpdater};
use crate::errors::{ApiError, ApiResult};

const BEFORE_UPDATE_OP: &str = "news:updater:before-update";
const ALL_FEEDS_OP: &str = "news:updater:all-feeds";
const UPDATE_FEED_OP: &str = "news:updater:update-feed";
const AFTER_UPDATE_OP: &str = "news:updater:after-update";

/// The occ command lines for one News installation.
#[derive(Debug, Clone)]
pub struct CliApi {
    level: ApiLevel,
    before_update: Vec<String>,
    all_feeds: Vec<String>,
    update_feed: Vec<String>,
    after_update: Vec<String>,
}

impl CliApi {
    pub fn new(directory: &str, phpini: Option<&str>, level: ApiLevel) -> Self {
        let mut directory = directory.to_string();
        if !directory.ends_with('/') {
            directory.push('/');
        }
        let mut base: Vec<String> = vec!["php".to_string(), "-f".to_string(), format!("{directory}occ")];
        if let Some(phpini) = phpini {
            if !phpini.trim().is_empty() {
                base.push("-c".to_string());
                base.push(phpini.to_string());
            }
        }
        let command = |op: &str| {
            let mut command = base.clone();
            command.push(op.to_string());
            command
        };
        Self {
            level,
            before_update: command(BEFORE_UPDATE_OP),
            all_feeds: command(ALL_FEEDS_OP),
            update_feed: command(UPDATE_FEED_OP),
            after_update: command(AFTER_UPDATE_OP),
        }
    }

    pub fn before_update_command(&self) -> &[String] {
        &self.before_update
    }

    pub fn all_feeds_command(&self) -> &[String] {
        &self.all_feeds
    }

    pub fn after_update_command(&self) -> &[String] {
        &self.after_update
    }

    /// Command line for updating one feed. News 15 swapped the argument
    /// order to `<user-id> <feed-id>`.
    pub fn update_feed_command(&self, job: &FeedJob) -> Vec<String> {
        let mut command = self.update_feed.clone();
        match self.level {
            ApiLevel::V15 => {
                command.push(job.user_id.clone());
                command.push(job.feed_id.to_string());
            }
            ApiLevel::V12 | ApiLevel::V2 => {
                command.push(job.feed_id.to_string());
                command.push(job.user_id.clone());
            }
        }
        command
    }
}

/// Feed source and updater backed by the News console API.
pub struct CliUpdater {
    api: CliApi,
    update_timeout: Option<Duration>,
}

impl CliUpdater {
    pub fn new(
        directory: &str,
        phpini: Option<&str>,
        level: ApiLevel,
        timeout_seconds: u64,
    ) -> Self {
        Self {
            api: CliApi::new(directory, phpini, level),
            update_timeout: (timeout_seconds > 0).then(|| Duration::from_secs(timeout_seconds)),
        }
    }

    async fn run_command(&self, command: &[String]) -> ApiResult<String> {
        let rendered = command.join(" ");
        let output = Command::new(&command[0])
            .args(&command[1..])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ApiError::CommandSpawn {
                command: rendered.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ApiError::CommandFailed {
                command: rendered,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl FeedSource for CliUpdater {
    async fn before_update(&self) -> ApiResult<()> {
        info!(
            "Running before update command: {}",
            self.api.before_update.join(" ")
        );
        self.run_command(&self.api.before_update).await.map(drop)
    }

    async fn all_feeds(&self) -> ApiResult<Vec<FeedJob>> {
        info!(
            "Running get all feeds command: {}",
            self.api.all_feeds.join(" ")
        );
        let stdout = self.run_command(&self.api.all_feeds).await?;
        let payload = stdout.trim();
        info!("Received these feeds to update: {payload}");
        parse_feed_list(self.api.level, payload)
    }

    async fn after_update(&self) -> ApiResult<()> {
        info!(
            "Running after update command: {}",
            self.api.after_update.join(" ")
        );
        self.run_command(&self.api.after_update).await.map(drop)
    }
}

#[async_trait]
impl FeedUpdater for CliUpdater {
    async fn update_feed(&self, job: &FeedJob) -> ApiResult<()> {
        let command = self.api.update_feed_command(job);
        info!("Running update command: {}", command.join(" "));
        let run = self.run_command(&command);
        match self.update_timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result.map(drop),
                Err(_) => Err(ApiError::Timeout {
                    feed_id: job.feed_id,
                    user_id: job.user_id.clone(),
                    seconds: limit.as_secs(),
                }),
            },
            None => run.await.map(drop),
        }
    }
}
