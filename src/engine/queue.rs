//! Pending URL queue
//!
//! A double-ended queue of URLs that have not been fetched yet. The
//! orchestrator takes from the front in bulk and requeues transient failures
//! at the back, so fresh URLs are never starved by repeatedly failing ones.

use std::collections::VecDeque;

/// Ordered collection of not-yet-fetched URLs
///
/// No deduplication happens here; callers dedupe when building the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingQueue {
    urls: VecDeque<String>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns up to `n` URLs from the front
    ///
    /// Returns fewer (possibly none) when the queue is shorter than `n`.
    pub fn take_front(&mut self, n: usize) -> Vec<String> {
        let count = n.min(self.urls.len());
        self.urls.drain(..count).collect()
    }

    /// Removes and returns up to `n` URLs from the back, last URL first
    pub fn take_back(&mut self, n: usize) -> Vec<String> {
        let count = n.min(self.urls.len());
        let mut taken = self.urls.split_off(self.urls.len() - count);
        taken.make_contiguous().reverse();
        taken.into()
    }

    pub fn push_back(&mut self, url: impl Into<String>) {
        self.urls.push_back(url.into());
    }

    pub fn push_front(&mut self, url: impl Into<String>) {
        self.urls.push_front(url.into());
    }

    /// Appends URLs at the back, in order
    pub fn extend_back<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls.extend(urls.into_iter().map(Into::into));
    }

    /// Prepends URLs at the front, keeping their given order
    pub fn extend_front<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: DoubleEndedIterator,
        S: Into<String>,
    {
        for url in urls.into_iter().rev() {
            self.urls.push_front(url.into());
        }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Iterates front to back without removing anything
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PendingQueue {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().map(Into::into).collect(),
        }
    }
}
