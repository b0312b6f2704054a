//! HTTP image fetcher
//!
//! Issues a GET per image with the configured headers and a per-request
//! timeout, then hands the body to the decoder.

use crate::fetcher::{FetchOutcome, Fetcher, ImageBounds};
use crate::{ConfigError, PagerError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Builds the HTTP client shared by every fetch of a search session
///
/// Configured headers are sent with each request; a `User-Agent` among them
/// replaces the default one.
///
/// # Example
///
/// ```no_run
/// use image_pager::fetcher::build_http_client;
/// use std::collections::BTreeMap;
///
/// let mut headers = BTreeMap::new();
/// headers.insert("Referer".to_string(), "https://example.com/".to_string());
/// let client = build_http_client(&headers).unwrap();
/// ```
pub fn build_http_client(headers: &BTreeMap<String, String>) -> Result<Client, PagerError> {
    let mut default_headers = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ConfigError::InvalidHeader(format!("'{}': {}", name, e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| ConfigError::InvalidHeader(format!("value of '{}': {}", name, e)))?;
        default_headers.insert(header_name, header_value);
    }

    let client = Client::builder()
        .user_agent(concat!("image-pager/", env!("CARGO_PKG_VERSION")))
        .default_headers(default_headers)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetcher backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    thumbnail: ImageBounds,
}

impl HttpFetcher {
    pub fn new(client: Client, thumbnail: ImageBounds) -> Self {
        Self { client, thumbnail }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
        let response = match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => return classify_request_error(url, &e),
        };

        // The body is decoded whatever the status; an error page is just an
        // undecodable payload
        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return classify_request_error(url, &e),
        };

        tracing::trace!("Fetched {} bytes from {} (HTTP {})", body.len(), url, status.as_u16());

        let owned_url = url.to_string();
        let thumbnail = self.thumbnail;
        match tokio::task::spawn_blocking(move || {
            FetchOutcome::from_bytes(&owned_url, &body, &thumbnail)
        })
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => FetchOutcome::permanent(url, format!("Decode task failed: {}", e)),
        }
    }
}

/// Maps a transport error onto an outcome
///
/// Only errors raised while building the request are permanent; anything
/// that happened on the wire may succeed on a later attempt.
fn classify_request_error(url: &str, e: &reqwest::Error) -> FetchOutcome {
    if e.is_builder() {
        FetchOutcome::permanent(url, format!("Invalid request: {}", e))
    } else if e.is_timeout() {
        FetchOutcome::retryable(url, "Request timeout")
    } else if e.is_connect() {
        FetchOutcome::retryable(url, "Connection failed")
    } else {
        FetchOutcome::retryable(url, e.to_string())
    }
}
