//! Shared queue of the feed updates pending in one cycle.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Mutex;

use crate::api::FeedJob;

/// Multi-consumer queue drained by the worker pool.
///
/// Claiming removes the job in the same locked step, so a job is handed to
/// exactly one worker and `claimed() + remaining() == total()` at every
/// point. Workers that observe an empty queue stop; nothing is requeued.
/// No ordering among jobs is guaranteed.
#[derive(Debug)]
pub struct FeedQueue {
    pending: Mutex<Vec<FeedJob>>,
    claimed: AtomicUsize,
    total: usize,
}

impl FeedQueue {
    pub fn new(jobs: Vec<FeedJob>) -> Self {
        Self {
            total: jobs.len(),
            claimed: AtomicUsize::new(0),
            pending: Mutex::new(jobs),
        }
    }

    /// Claims one pending job, or `None` once the queue is drained.
    pub async fn claim(&self) -> Option<FeedJob> {
        let mut pending = self.pending.lock().await;
        let job = pending.pop()?;
        self.claimed.fetch_add(1, Ordering::Relaxed);
        Some(job)
    }

    /// Number of jobs the queue was created with.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of jobs handed out to workers so far.
    pub fn claimed(&self) -> usize {
        self.claimed.load(Ordering::Relaxed)
    }

    /// Number of jobs still waiting to be claimed.
    pub async fn remaining(&self) -> usize {
        self.pending.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn jobs(count: usize) -> Vec<FeedJob> {
        (0..count)
            .map(|i| FeedJob::new(i as i64, format!("user{i}")))
            .collect()
    }

    #[tokio::test]
    async fn claims_every_job_exactly_once() {
        let queue = FeedQueue::new(jobs(5));
        let mut seen = HashSet::new();
        while let Some(job) = queue.claim().await {
            assert!(seen.insert(job.feed_id));
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(queue.claimed(), 5);
        assert_eq!(queue.remaining().await, 0);
    }

    #[tokio::test]
    async fn empty_queue_yields_nothing() {
        let queue = FeedQueue::new(Vec::new());
        assert!(queue.claim().await.is_none());
        assert_eq!(queue.total(), 0);
        assert_eq!(queue.claimed(), 0);
    }

    #[tokio::test]
    async fn counters_stay_consistent_while_draining() {
        let queue = FeedQueue::new(jobs(4));
        assert_eq!(queue.total(), 4);
        queue.claim().await.unwrap();
        assert_eq!(queue.claimed() + queue.remaining().await, queue.total());
        queue.claim().await.unwrap();
        assert_eq!(queue.claimed() + queue.remaining().await, queue.total());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_claims_never_duplicate() {
        let queue = Arc::new(FeedQueue::new(jobs(100)));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                let mut claimed = Vec::new();
                while let Some(job) = queue.claim().await {
                    claimed.push(job.feed_id);
                }
                claimed
            }));
        }
        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        let unique: HashSet<_> = all.iter().copied().collect();
        assert_eq!(all.len(), 100);
        assert_eq!(unique.len(), 100);
        assert_eq!(queue.claimed(), 100);
    }
}
