//! Image-Pager: a paginated remote image browser engine
//!
//! This crate pages through a stream of remote image URLs, fetching and
//! decoding them concurrently under a connection budget. Transient network
//! failures are requeued and backfilled up to a retry depth, and the caller
//! can mark a subset of the fetched images for saving when the session closes.

pub mod config;
pub mod engine;
pub mod fetcher;
pub mod search;
pub mod session;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Image-Pager operations
///
/// Per-URL fetch failures never show up here: the orchestrator absorbs them
/// and they only manifest as a shorter batch.
#[derive(Debug, Error)]
pub enum PagerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Search session is closed")]
    SessionClosed,

    #[error("Empty search query")]
    EmptyQuery,

    #[error("No search source configured")]
    NoSearchSource,

    #[error("Selection index {index} out of range (gallery holds {len} images)")]
    InvalidSelection { index: usize, len: usize },

    #[error("Connection budget must allow at least one fetch, got {0}")]
    InvalidBudget(usize),

    #[error("Failed to save image to {path}: {source}")]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),
}

/// Result type alias for Image-Pager operations
pub type Result<T> = std::result::Result<T, PagerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use engine::{
    Advance, Batch, BatchOrchestrator, BatchStats, ConnectionBudget, PaginationSession,
    PendingQueue, RenderSink,
};
pub use fetcher::{FetchOutcome, FetchedImage, Fetcher, HttpFetcher, ImageBounds, ImageId};
pub use search::{HttpListSource, SearchError, StaticUrls, UrlSource};
pub use session::{CloseReport, Gallery, SearchSession};
