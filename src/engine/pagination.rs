//! "Show more" pagination over the batch orchestrator
//!
//! Each `advance()` fetches enough images to fill the current page, topping
//! up a partially filled last row first, and hands them to the render sink.
//! Control returns to the caller after every batch.

use crate::engine::{Batch, BatchOrchestrator};
use crate::fetcher::FetchedImage;
use crate::PagerError;

/// Receives each rendered batch
///
/// `first_index` is the gallery position of `images[0]`; the grid cell of
/// image `i` is `(first_index + i) / images_per_row` by
/// `(first_index + i) % images_per_row`.
pub trait RenderSink {
    fn render(&mut self, first_index: usize, images: &[FetchedImage]);
}

/// Result of one `advance()` call
#[derive(Debug)]
pub enum Advance {
    /// A batch was fetched and rendered (it may be short or even empty)
    Rendered { first_index: usize, batch: Batch },

    /// Nothing is left to fetch; no render happened
    Exhausted,
}

/// Resumable controller driving one fetch cycle per `advance()`
pub struct PaginationSession {
    orchestrator: BatchOrchestrator,
    images_per_row: usize,
    rows: usize,
    shown: usize,
    exhausted: bool,
}

impl PaginationSession {
    pub fn new(orchestrator: BatchOrchestrator, images_per_row: usize, rows: usize) -> Self {
        Self {
            orchestrator,
            images_per_row: images_per_row.max(1),
            rows: rows.max(1),
            shown: 0,
            exhausted: false,
        }
    }

    /// Number of images the next `advance()` asks for
    ///
    /// A full page, minus the images already sitting in a partial last row.
    pub fn needed(&self) -> usize {
        self.images_per_row * self.rows - self.shown % self.images_per_row
    }

    /// Runs one fetch cycle and renders the result
    ///
    /// Calling this after exhaustion is a no-op returning `Advance::Exhausted`.
    /// The session becomes exhausted once a cycle yields no image and the
    /// queue is empty.
    pub async fn advance(&mut self, sink: &mut dyn RenderSink) -> Result<Advance, PagerError> {
        if self.exhausted {
            return Ok(Advance::Exhausted);
        }

        let batch = self.orchestrator.process_batch(self.needed()).await?;

        if batch.is_empty() && self.orchestrator.queue().is_empty() {
            tracing::info!("No more images to show after {}", self.shown);
            self.exhausted = true;
            return Ok(Advance::Exhausted);
        }

        let first_index = self.shown;
        sink.render(first_index, &batch.images);
        self.shown += batch.len();

        Ok(Advance::Rendered { first_index, batch })
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Total images rendered so far
    pub fn shown(&self) -> usize {
        self.shown
    }

    pub fn orchestrator(&self) -> &BatchOrchestrator {
        &self.orchestrator
    }
}
