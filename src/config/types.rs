use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Image-Pager
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetch: FetchConfig,
    pub layout: LayoutConfig,
    #[serde(default)]
    pub thumbnail: BoundsConfig,
    pub save: SaveConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    /// Maximum number of simultaneous in-flight fetches
    ///
    /// Falls back to one page worth of images when no explicit limit is set.
    pub fn connection_limit(&self) -> usize {
        self.fetch
            .connection_limit
            .unwrap_or_else(|| self.layout.images_per_page())
    }
}

/// Fetch behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How many backfill levels a single batch request may spawn
    #[serde(rename = "max-retry-depth", default = "default_max_retry_depth")]
    pub max_retry_depth: u32,

    /// Explicit cap on concurrent fetches
    #[serde(rename = "connection-limit")]
    pub connection_limit: Option<usize>,

    /// Headers sent with every image request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_max_retry_depth() -> u32 {
    5
}

/// Grid layout of the rendered gallery
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    /// Number of images per visual row
    #[serde(rename = "images-per-row", default = "default_images_per_row")]
    pub images_per_row: usize,

    /// Number of rows revealed per "show more"
    #[serde(default = "default_rows")]
    pub rows: usize,
}

impl LayoutConfig {
    pub fn images_per_page(&self) -> usize {
        self.images_per_row * self.rows
    }
}

fn default_images_per_row() -> usize {
    3
}

fn default_rows() -> usize {
    1
}

/// Optional maximum dimensions for a resized image
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BoundsConfig {
    #[serde(rename = "max-width")]
    pub max_width: Option<u32>,

    #[serde(rename = "max-height")]
    pub max_height: Option<u32>,
}

/// Where and how selected images are written on close
#[derive(Debug, Clone, Deserialize)]
pub struct SaveConfig {
    /// Directory receiving the saved PNG files
    pub directory: String,

    /// File stem pattern; `{}` is replaced by the image id
    #[serde(rename = "name-pattern", default = "default_name_pattern")]
    pub name_pattern: String,

    /// Size limits applied before saving
    #[serde(flatten)]
    pub bounds: BoundsConfig,
}

fn default_name_pattern() -> String {
    "{}".to_string()
}

/// Sources of image URLs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchConfig {
    /// Endpoint answering `?q=<term>` with one URL per line
    pub endpoint: Option<String>,

    /// URLs queued ahead of the first search's results
    #[serde(rename = "init-urls", default)]
    pub init_urls: Vec<String>,
}
