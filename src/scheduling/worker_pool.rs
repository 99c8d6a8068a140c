//! Fork-join worker pool executing the feed updates of one cycle.

use std::sync::Arc;

use tracing::{error, info};

use super::FeedQueue;
use crate::api::FeedUpdater;

/// Executes every queued feed update using a fixed number of workers.
///
/// A fresh set of workers is spawned for every cycle and joined before the
/// cycle continues. A failing update is logged and the worker claims the
/// next job; one bad feed must not block the rest, so job errors are never
/// retried and never reach the caller.
pub struct WorkerPool {
    worker_count: usize,
}

impl WorkerPool {
    pub fn new(worker_count: usize) -> Self {
        Self { worker_count }
    }

    /// Runs updates until the queue is drained and every worker has exited.
    pub async fn run(&self, queue: Arc<FeedQueue>, updater: Arc<dyn FeedUpdater>) {
        let mut workers = Vec::with_capacity(self.worker_count);
        for _ in 0..self.worker_count {
            let queue = Arc::clone(&queue);
            let updater = Arc::clone(&updater);
            workers.push(tokio::spawn(async move {
                while let Some(job) = queue.claim().await {
                    info!(
                        "Updating feed with id {} and user {}",
                        job.feed_id, job.user_id
                    );
                    if let Err(e) = updater.update_feed(&job).await {
                        error!(
                            "Failed to update feed with id {} and user {}: {}",
                            job.feed_id, job.user_id, e
                        );
                    }
                }
            }));
        }
        for worker in workers {
            if let Err(e) = worker.await {
                error!("Update worker stopped abnormally: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::api::FeedJob;
    use crate::errors::{ApiError, ApiResult};

    /// Counts update invocations per feed; fails the configured feed ids.
    struct CountingUpdater {
        invocations: Mutex<HashMap<i64, usize>>,
        failing_feeds: Vec<i64>,
    }

    impl CountingUpdater {
        fn new(failing_feeds: Vec<i64>) -> Self {
            Self {
                invocations: Mutex::new(HashMap::new()),
                failing_feeds,
            }
        }

        fn counts(&self) -> HashMap<i64, usize> {
            self.invocations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeedUpdater for CountingUpdater {
        async fn update_feed(&self, job: &FeedJob) -> ApiResult<()> {
            *self
                .invocations
                .lock()
                .unwrap()
                .entry(job.feed_id)
                .or_insert(0) += 1;
            if self.failing_feeds.contains(&job.feed_id) {
                return Err(ApiError::HttpStatus {
                    status: 500,
                    url: format!("http://localhost/feeds/update?feedId={}", job.feed_id),
                });
            }
            Ok(())
        }
    }

    fn jobs(count: usize) -> Vec<FeedJob> {
        (0..count)
            .map(|i| FeedJob::new(i as i64, format!("user{i}")))
            .collect()
    }

    #[tokio::test]
    async fn updates_every_job_exactly_once() {
        let updater = Arc::new(CountingUpdater::new(Vec::new()));
        let queue = Arc::new(FeedQueue::new(jobs(5)));
        WorkerPool::new(2).run(Arc::clone(&queue), updater.clone()).await;

        let counts = updater.counts();
        assert_eq!(counts.len(), 5);
        assert!(counts.values().all(|&count| count == 1));
        assert_eq!(queue.remaining().await, 0);
    }

    #[tokio::test]
    async fn more_workers_than_jobs_do_not_duplicate() {
        let updater = Arc::new(CountingUpdater::new(Vec::new()));
        let queue = Arc::new(FeedQueue::new(jobs(3)));
        WorkerPool::new(8).run(queue, updater.clone()).await;

        let counts = updater.counts();
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|&count| count == 1));
    }

    #[tokio::test]
    async fn failing_job_does_not_stop_the_pool() {
        let updater = Arc::new(CountingUpdater::new(vec![2]));
        let queue = Arc::new(FeedQueue::new(jobs(6)));
        WorkerPool::new(3).run(queue, updater.clone()).await;

        let counts = updater.counts();
        assert_eq!(counts.len(), 6);
        assert!(counts.values().all(|&count| count == 1));
    }

    #[tokio::test]
    async fn empty_queue_completes_without_invocations() {
        let updater = Arc::new(CountingUpdater::new(Vec::new()));
        let queue = Arc::new(FeedQueue::new(Vec::new()));
        WorkerPool::new(4).run(queue, updater.clone()).await;
        assert!(updater.counts().is_empty());
    }
}
