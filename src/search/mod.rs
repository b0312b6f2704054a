//! URL-producing search sources
//!
//! A search turns a query term into the list of image URLs that seeds the
//! pending queue. A failing search is reported once to the caller and the
//! engine does not start.

mod http_list;

pub use http_list::HttpListSource;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while searching for image URLs
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Check your internet connection: could not reach {endpoint}: {source}")]
    Connectivity {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("Search endpoint {endpoint} answered HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Invalid search endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Produces image URLs for a query term
#[async_trait]
pub trait UrlSource: Send + Sync {
    async fn search(&self, term: &str) -> SearchResult<Vec<String>>;
}

/// A fixed list of URLs returned for every term
#[derive(Debug, Clone, Default)]
pub struct StaticUrls {
    urls: Vec<String>,
}

impl StaticUrls {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }
}

#[async_trait]
impl UrlSource for StaticUrls {
    async fn search(&self, _term: &str) -> SearchResult<Vec<String>> {
        Ok(self.urls.clone())
    }
}

/// Parses a plain-text URL listing: one URL per line
///
/// Blank lines and `#` comments are skipped, surrounding whitespace trimmed.
pub fn parse_url_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
