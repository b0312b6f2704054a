//! Batch orchestration with retry and backfill
//!
//! This module turns "give me `step` images" into concurrent fetches:
//! - Takes up to `step` URLs from the front of the pending queue
//! - Dispatches them concurrently, bounded by the connection budget
//! - Classifies outcomes in completion order
//! - Requeues transient failures at the tail and drops undecodable ones
//! - Backfills the shortfall level by level, up to the retry depth
//!
//! # Backfill Logic
//!
//! | Outcome            | Queue effect      | Counts toward shortfall |
//! |--------------------|-------------------|-------------------------|
//! | `Success`          | none              | no                      |
//! | `RetryableFailure` | pushed to tail    | yes                     |
//! | `PermanentFailure` | dropped           | yes                     |
//!
//! The depth limit bounds work per call, not per URL: a URL that keeps
//! timing out stays in the queue and may be tried again by a later call.

use crate::engine::{ConnectionBudget, PendingQueue};
use crate::fetcher::{FetchOutcome, FetchedImage, Fetcher};
use crate::PagerError;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;

/// Limits applied to every fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of backfill levels allowed below the initial dispatch
    pub max_retry_depth: u32,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry_depth: 5,
            timeout: Duration::from_secs(1),
        }
    }
}

/// Counters describing one `process_batch` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Dispatch levels that actually ran (initial + backfills)
    pub levels: u32,

    /// URLs taken from the queue and fetched
    pub dispatched: usize,

    /// Transient failures pushed back to the queue tail
    pub requeued: usize,

    /// Undecodable payloads discarded
    pub dropped: usize,
}

/// Successful images of one orchestration call, in completion order
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub images: Vec<FetchedImage>,
    pub stats: BatchStats,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn into_images(self) -> Vec<FetchedImage> {
        self.images
    }
}

/// Pulls URLs from the pending queue and fetches them with backfill
pub struct BatchOrchestrator {
    queue: PendingQueue,
    fetcher: Arc<dyn Fetcher>,
    budget: ConnectionBudget,
    policy: RetryPolicy,
}

impl BatchOrchestrator {
    pub fn new(
        queue: PendingQueue,
        fetcher: Arc<dyn Fetcher>,
        budget: ConnectionBudget,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            queue,
            fetcher,
            budget,
            policy,
        }
    }

    /// Fetches up to `step` images
    ///
    /// Per-URL failures never surface as errors; they only make the batch
    /// shorter. The batch reaches `step` whenever the queue holds enough URLs
    /// that eventually succeed within the retry depth.
    ///
    /// # Returns
    ///
    /// * `Ok(Batch)` - Successes in completion order, possibly empty
    /// * `Err(PagerError::SessionClosed)` - The budget was closed; the queue
    ///   is left untouched
    pub async fn process_batch(&mut self, step: usize) -> Result<Batch, PagerError> {
        if self.budget.is_closed() {
            return Err(PagerError::SessionClosed);
        }

        let mut batch = Batch::default();
        let mut wanted = step;
        let mut depth = 0;

        loop {
            let urls = self.queue.take_front(wanted);
            if urls.is_empty() {
                break;
            }

            batch.stats.levels += 1;
            batch.stats.dispatched += urls.len();

            let shortfall = self.dispatch_level(urls, &mut batch).await;
            if shortfall == 0 {
                break;
            }

            if depth >= self.policy.max_retry_depth {
                tracing::debug!(
                    "Retry depth {} reached with {} images still missing",
                    depth,
                    shortfall
                );
                break;
            }

            tracing::debug!("Backfilling {} images at depth {}", shortfall, depth + 1);
            depth += 1;
            wanted = shortfall;
        }

        tracing::info!(
            "Batch complete: {}/{} images over {} levels ({} requeued, {} dropped, {} pending)",
            batch.len(),
            step,
            batch.stats.levels,
            batch.stats.requeued,
            batch.stats.dropped,
            self.queue.len()
        );

        Ok(batch)
    }

    /// Fetches one level of URLs and returns how many did not succeed
    ///
    /// Outcomes are handled as they complete. Queue updates happen between
    /// polls, never while a fetch is mid-flight on this task.
    async fn dispatch_level(&mut self, urls: Vec<String>, batch: &mut Batch) -> usize {
        let timeout = self.policy.timeout;

        let mut in_flight: FuturesUnordered<_> = urls
            .into_iter()
            .map(|url| {
                let fetcher = Arc::clone(&self.fetcher);
                let budget = self.budget.clone();
                async move {
                    let _permit = match budget.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => return FetchOutcome::retryable(&url, "Connection budget closed"),
                    };
                    fetcher.fetch(&url, timeout).await
                }
            })
            .collect();

        let mut shortfall = 0;
        while let Some(outcome) = in_flight.next().await {
            match outcome {
                FetchOutcome::Success(image) => {
                    tracing::debug!("Fetched {} as {}", image.url, image.id);
                    batch.images.push(image);
                }
                FetchOutcome::RetryableFailure { url, reason } => {
                    tracing::debug!("Requeueing {}: {}", url, reason);
                    self.queue.push_back(url);
                    batch.stats.requeued += 1;
                    shortfall += 1;
                }
                FetchOutcome::PermanentFailure { url, reason } => {
                    tracing::debug!("Dropping {}: {}", url, reason);
                    batch.stats.dropped += 1;
                    shortfall += 1;
                }
            }
        }

        shortfall
    }

    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    pub fn budget(&self) -> &ConnectionBudget {
        &self.budget
    }
}
