//! Image fetching and outcome classification
//!
//! A fetch performs one GET, decodes the body as an image and produces a
//! display-sized thumbnail. Every failure is folded into a [`FetchOutcome`]
//! so the orchestrator can decide between requeueing and dropping the URL:
//!
//! | Condition                          | Outcome            |
//! |------------------------------------|--------------------|
//! | Timeout, connect error, body error | `RetryableFailure` |
//! | Malformed request URL              | `PermanentFailure` |
//! | Body is not a decodable image      | `PermanentFailure` |
//!
//! The HTTP status plays no part: the body of any response is decoded, so
//! an error page becomes a permanent failure and a 404 that still serves
//! an image becomes a success.

mod http;
pub mod imaging;

pub use http::{build_http_client, HttpFetcher};
pub use imaging::ImageBounds;

use async_trait::async_trait;
use image::DynamicImage;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

/// Stable identifier of an image, derived from its source URL
///
/// Used both as a correlation key for the presentation layer and as the
/// default file stem when the image is saved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(String);

impl ImageId {
    /// Hex-encoded first 8 bytes of the SHA-256 of the URL
    pub fn from_url(url: &str) -> Self {
        let digest = Sha256::digest(url.as_bytes());
        Self(hex::encode(&digest[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A successfully fetched and decoded image
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub id: ImageId,

    /// Source URL
    pub url: String,

    /// Copy shrunk to the display bounds
    pub thumbnail: DynamicImage,

    /// Decoded image at its original size
    pub full_image: DynamicImage,
}

/// Classified result of a single fetch
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The image was fetched and decoded
    Success(FetchedImage),

    /// Network-level failure; the URL may be requeued
    RetryableFailure {
        url: String,
        reason: String,
    },

    /// The payload can never become an image; the URL is dropped
    PermanentFailure {
        url: String,
        reason: String,
    },
}

impl FetchOutcome {
    /// Decodes a response body into a success, or a permanent failure if
    /// the bytes are not an image
    pub fn from_bytes(url: &str, bytes: &[u8], thumbnail_bounds: &ImageBounds) -> Self {
        match imaging::decode(bytes) {
            Ok(full_image) => Self::Success(FetchedImage {
                id: ImageId::from_url(url),
                url: url.to_string(),
                thumbnail: thumbnail_bounds.shrink(&full_image),
                full_image,
            }),
            Err(e) => Self::PermanentFailure {
                url: url.to_string(),
                reason: format!("Undecodable image: {}", e),
            },
        }
    }

    pub fn retryable(url: &str, reason: impl Into<String>) -> Self {
        Self::RetryableFailure {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn permanent(url: &str, reason: impl Into<String>) -> Self {
        Self::PermanentFailure {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// The URL this outcome belongs to
    pub fn url(&self) -> &str {
        match self {
            Self::Success(image) => &image.url,
            Self::RetryableFailure { url, .. } | Self::PermanentFailure { url, .. } => url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Performs one fetch-and-decode of a URL
///
/// Implementations must not touch the pending queue or any shared counter;
/// they only report what happened.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome;
}
