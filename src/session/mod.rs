//! Search session lifecycle
//!
//! A search session brackets all fetch activity for one query window:
//! - `open` runs the search, seeds the queue and acquires the connection budget
//! - `show_more` advances pagination and records the rendered images
//! - `restart` swaps in a fresh queue and pagination for a new query
//! - `close` releases the budget and saves the selected images

mod gallery;
mod persist;

pub use gallery::Gallery;
pub use persist::{format_name, save_image};

use crate::config::Config;
use crate::engine::{
    Advance, BatchOrchestrator, ConnectionBudget, PaginationSession, PendingQueue, RenderSink,
    RetryPolicy,
};
use crate::fetcher::{build_http_client, Fetcher, HttpFetcher, ImageBounds, ImageId};
use crate::search::{HttpListSource, UrlSource};
use crate::{PagerError, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// What a closed session leaves behind
#[derive(Debug)]
pub struct CloseReport {
    /// The last query of the session
    pub search_term: String,

    /// Ids of every image shown, in gallery order
    pub names: Vec<ImageId>,

    /// Gallery indices that were selected, in pick order
    pub selected: Vec<usize>,

    /// Files written for the selected images
    pub saved: Vec<PathBuf>,

    /// Selected images that could not be written
    pub failed: Vec<(ImageId, PagerError)>,
}

/// One image-search window: queue, pagination, gallery and selection
pub struct SearchSession {
    config: Config,
    search_term: String,
    source: Option<Arc<dyn UrlSource>>,
    fetcher: Arc<dyn Fetcher>,
    budget: ConnectionBudget,
    pagination: PaginationSession,
    gallery: Gallery,
}

impl SearchSession {
    /// Opens a session for `term`
    ///
    /// The queue holds the configured initial URLs followed by the search
    /// results, without duplicates. A failing search aborts the open.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchSession)` - Ready for `show_more`
    /// * `Err(PagerError::EmptyQuery)` - The term is blank
    /// * `Err(PagerError::Search)` - The search source failed
    pub async fn open(
        config: &Config,
        term: &str,
        source: Option<Arc<dyn UrlSource>>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let term = term.trim();
        if term.is_empty() {
            return Err(PagerError::EmptyQuery);
        }

        let mut urls = config.search.init_urls.clone();
        if let Some(source) = &source {
            urls.extend(source.search(term).await?);
        }

        let budget = ConnectionBudget::open(config.connection_limit())?;
        let pagination = build_pagination(config, dedupe(urls), &fetcher, &budget);

        tracing::info!(
            "Opened search '{}' with {} URLs and {} connections",
            term,
            pagination.orchestrator().queue().len(),
            budget.limit()
        );

        Ok(Self {
            config: config.clone(),
            search_term: term.to_string(),
            source,
            fetcher,
            budget,
            pagination,
            gallery: Gallery::new(),
        })
    }

    /// Opens a session wired to HTTP: image fetches over a shared client and,
    /// when an endpoint is configured, an HTTP search source
    pub async fn open_http(config: &Config, term: &str) -> Result<Self> {
        let client = build_http_client(&config.fetch.headers)?;

        let source: Option<Arc<dyn UrlSource>> = match &config.search.endpoint {
            Some(endpoint) => Some(Arc::new(HttpListSource::new(client.clone(), endpoint)?)),
            None => None,
        };
        let fetcher = Arc::new(HttpFetcher::new(client, ImageBounds::from(config.thumbnail)));

        Self::open(config, term, source, fetcher).await
    }

    /// Fetches and renders the next page, returning how many images it added
    pub async fn show_more(&mut self, sink: &mut dyn RenderSink) -> Result<usize> {
        match self.pagination.advance(sink).await? {
            Advance::Rendered { batch, .. } => {
                let count = batch.len();
                self.gallery.extend(batch.into_images());
                Ok(count)
            }
            Advance::Exhausted => Ok(0),
        }
    }

    /// Starts over with a new query
    ///
    /// On any error the current queue, gallery and selection are kept.
    pub async fn restart(&mut self, term: &str) -> Result<()> {
        let term = term.trim();
        if term.is_empty() {
            return Err(PagerError::EmptyQuery);
        }
        if self.budget.is_closed() {
            return Err(PagerError::SessionClosed);
        }
        let source = self.source.as_ref().ok_or(PagerError::NoSearchSource)?;

        let urls = source.search(term).await?;
        self.pagination = build_pagination(&self.config, dedupe(urls), &self.fetcher, &self.budget);
        self.gallery = Gallery::new();
        self.search_term = term.to_string();

        tracing::info!(
            "Restarted search '{}' with {} URLs",
            self.search_term,
            self.pagination.orchestrator().queue().len()
        );
        Ok(())
    }

    /// Flips the selection of a gallery image
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        self.gallery.toggle(index)
    }

    /// Marks a gallery image as selected; selecting it again changes nothing
    pub fn select(&mut self, index: usize) -> Result<()> {
        self.gallery.select(index)
    }

    /// Releases the connection budget and saves the selected images
    ///
    /// Images are written in pick order. A failed write is logged and
    /// reported without stopping the remaining saves; if the save directory
    /// cannot be created every selected image is reported as failed.
    pub fn close(self) -> CloseReport {
        self.budget.close();

        let directory = PathBuf::from(&self.config.save.directory);
        let bounds = ImageBounds::from(self.config.save.bounds);
        let mut saved = Vec::new();
        let mut failed = Vec::new();

        let directory_ready = if self.gallery.selected().is_empty() {
            false
        } else if let Err(e) = std::fs::create_dir_all(&directory) {
            tracing::warn!("Failed to create {}: {}", directory.display(), e);
            for &index in self.gallery.selected() {
                if let Some(image) = self.gallery.get(index) {
                    let error = std::io::Error::new(e.kind(), e.to_string());
                    failed.push((image.id.clone(), PagerError::Io(error)));
                }
            }
            false
        } else {
            true
        };

        if directory_ready {
            for &index in self.gallery.selected() {
                let Some(image) = self.gallery.get(index) else {
                    continue;
                };
                let name = format_name(&self.config.save.name_pattern, &image.id);
                match save_image(&image.full_image, &directory, &name, &bounds) {
                    Ok(path) => saved.push(path),
                    Err(e) => {
                        tracing::warn!("Failed to save {}: {}", image.url, e);
                        failed.push((image.id.clone(), e));
                    }
                }
            }
        }

        tracing::info!(
            "Closed search '{}': saved {} of {} selected images",
            self.search_term,
            saved.len(),
            self.gallery.selected().len()
        );

        CloseReport {
            search_term: self.search_term,
            names: self.gallery.ids(),
            selected: self.gallery.selected().to_vec(),
            saved,
            failed,
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    /// False once pagination is exhausted
    pub fn has_more(&self) -> bool {
        !self.pagination.is_exhausted()
    }

    pub fn pagination(&self) -> &PaginationSession {
        &self.pagination
    }
}

fn build_pagination(
    config: &Config,
    queue: PendingQueue,
    fetcher: &Arc<dyn Fetcher>,
    budget: &ConnectionBudget,
) -> PaginationSession {
    let policy = RetryPolicy {
        max_retry_depth: config.fetch.max_retry_depth,
        timeout: config.fetch.timeout(),
    };
    let orchestrator = BatchOrchestrator::new(queue, Arc::clone(fetcher), budget.clone(), policy);
    PaginationSession::new(orchestrator, config.layout.images_per_row, config.layout.rows)
}

/// Builds a queue keeping the first occurrence of each URL
fn dedupe(urls: Vec<String>) -> PendingQueue {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
