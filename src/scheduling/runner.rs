//! The update cycle: hooks, feed fetch, parallel dispatch, interval timing.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

use super::{FeedQueue, WorkerPool};
use crate::api::{FeedSource, FeedUpdater};
use crate::config::{Config, Mode};
use crate::errors::ApiError;

/// Cooldown before re-running a cycle whose hook or fetch phase failed.
/// Retries are unbounded; the process runs until externally terminated.
const CYCLE_RETRY_COOLDOWN: Duration = Duration::from_secs(30);

/// Drives update cycles: before hook, feed fetch, parallel dispatch, after
/// hook, then interval wait (endless mode) or return (singlerun mode).
pub struct UpdateRunner {
    source: Arc<dyn FeedSource>,
    updater: Arc<dyn FeedUpdater>,
    pool: WorkerPool,
    threads: usize,
    interval: Duration,
    mode: Mode,
}

impl UpdateRunner {
    pub fn new(
        config: &Config,
        source: Arc<dyn FeedSource>,
        updater: Arc<dyn FeedUpdater>,
    ) -> Self {
        Self {
            source,
            updater,
            pool: WorkerPool::new(config.threads),
            threads: config.threads,
            interval: Duration::from_secs(config.interval),
            mode: config.mode,
        }
    }

    /// Runs update cycles until done: returns after one cycle in singlerun
    /// mode and never returns in endless mode.
    pub async fn run(&self) {
        match self.mode {
            Mode::Singlerun => {
                info!("Running update once with {} threads", self.threads);
            }
            Mode::Endless => {
                info!(
                    "Running update in an interval of {} seconds using {} threads",
                    self.interval.as_secs(),
                    self.threads
                );
            }
        }
        loop {
            let cycle_start = Instant::now();
            match self.run_cycle().await {
                Ok(()) => {
                    if self.mode == Mode::Singlerun {
                        return;
                    }
                    let elapsed = cycle_start.elapsed();
                    let wait = remaining_wait(self.interval, elapsed);
                    if wait.is_zero() {
                        warn!(
                            "Update took {} seconds, longer than the interval of {} seconds; starting the next update immediately",
                            elapsed.as_secs(),
                            self.interval.as_secs()
                        );
                    } else {
                        info!(
                            "Finished updating in {} seconds, next update in {} seconds",
                            elapsed.as_secs(),
                            wait.as_secs()
                        );
                        tokio::time::sleep(wait).await;
                    }
                }
                Err(e) => {
                    error!("{e}: will retry in 30 seconds");
                    if self.mode == Mode::Singlerun {
                        return;
                    }
                    tokio::time::sleep(CYCLE_RETRY_COOLDOWN).await;
                }
            }
        }
    }

    /// One full cycle. Job-level failures are absorbed by the pool; an
    /// error from a hook or the feed fetch fails the whole cycle.
    async fn run_cycle(&self) -> Result<(), ApiError> {
        self.source.before_update().await?;
        let feeds = self.source.all_feeds().await?;
        let queue = Arc::new(FeedQueue::new(feeds));
        self.pool
            .run(Arc::clone(&queue), Arc::clone(&self.updater))
            .await;
        self.source.after_update().await?;
        Ok(())
    }
}

/// Time left of `interval` after a cycle that took `elapsed`; zero when the
/// cycle overran the interval.
fn remaining_wait(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}
