//! Connection budget shared by all fetches of a search session

use crate::PagerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Process-wide ceiling on simultaneous in-flight fetches
///
/// Cloning is cheap and every clone shares the same permits. Once closed,
/// no further permit can be acquired by any clone.
#[derive(Debug, Clone)]
pub struct ConnectionBudget {
    semaphore: Arc<Semaphore>,
    closed: Arc<AtomicBool>,
    limit: usize,
}

impl ConnectionBudget {
    /// Opens a budget allowing `limit` concurrent fetches
    pub fn open(limit: usize) -> Result<Self, PagerError> {
        if limit == 0 {
            return Err(PagerError::InvalidBudget(limit));
        }

        tracing::debug!("Opening connection budget with {} slots", limit);
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            closed: Arc::new(AtomicBool::new(false)),
            limit,
        })
    }

    /// Waits for a free slot
    ///
    /// The slot is released when the returned permit is dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, PagerError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PagerError::SessionClosed)
    }

    /// Tears the budget down; pending and future acquisitions fail
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("Closing connection budget");
            self.semaphore.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
