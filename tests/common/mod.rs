//! Shared test doubles for the engine and session tests

#![allow(dead_code)]

use async_trait::async_trait;
use image::DynamicImage;
use image_pager::engine::{BatchOrchestrator, ConnectionBudget, PendingQueue, RetryPolicy};
use image_pager::{FetchOutcome, FetchedImage, Fetcher, ImageId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a scripted fetch of a URL does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Ok,
    Timeout,
    Undecodable,
}

/// Fetcher that plays back per-URL scripts and records concurrency
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    delays: Mutex<HashMap<String, Duration>>,
    fallback: Step,
    default_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    /// Every URL without a script behaves like `fallback`
    pub fn new(fallback: Step) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            fallback,
            default_delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Successive fetches of `url` follow `steps`, then the fallback
    pub fn script(self, url: &str, steps: &[Step]) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), steps.iter().copied().collect());
        self
    }

    pub fn delay(self, url: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(url.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> FetchOutcome {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(url.to_string());

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or(self.fallback);
        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(self.default_delay);

        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match step {
            Step::Ok => FetchOutcome::Success(fetched(url)),
            Step::Timeout => FetchOutcome::retryable(url, "Request timeout"),
            Step::Undecodable => FetchOutcome::permanent(url, "Undecodable image"),
        }
    }
}

pub fn fetched(url: &str) -> FetchedImage {
    let image = DynamicImage::new_rgb8(8, 6);
    FetchedImage {
        id: ImageId::from_url(url),
        url: url.to_string(),
        thumbnail: image.clone(),
        full_image: image,
    }
}

/// `n` distinct URLs: u1, u2, ...
pub fn urls(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("https://img.test/u{}.png", i)).collect()
}

pub fn url(i: usize) -> String {
    format!("https://img.test/u{}.png", i)
}

pub fn orchestrator(
    urls: Vec<String>,
    fetcher: &Arc<ScriptedFetcher>,
    limit: usize,
    max_retry_depth: u32,
) -> BatchOrchestrator {
    let fetcher: Arc<dyn Fetcher> = fetcher.clone();
    BatchOrchestrator::new(
        urls.into_iter().collect::<PendingQueue>(),
        fetcher,
        ConnectionBudget::open(limit).unwrap(),
        RetryPolicy {
            max_retry_depth,
            timeout: Duration::from_millis(500),
        },
    )
}

pub fn queued(orchestrator: &BatchOrchestrator) -> Vec<String> {
    orchestrator.queue().iter().map(str::to_string).collect()
}
