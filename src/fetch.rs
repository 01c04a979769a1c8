//! HTTP fetch capability.
//!
//! The quality search only ever needs "give me the bytes behind this URL",
//! so that is the whole [`Fetcher`] trait. [`HttpFetcher`] implements it
//! with a blocking `reqwest` client; every call blocks the calling worker
//! until the response body is read or fails. Without `fetch.timeout_secs`
//! there is no deadline at all, not even reqwest's stock 30 seconds.
//! Failures are never retried here.

use crate::config::FetchConfig;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Something that can fetch the body behind a URL.
pub trait Fetcher: Sync {
    /// Fetch the full response body.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Size in bytes of the response body.
    fn body_len(&self, url: &str) -> Result<u64, FetchError> {
        Ok(self.fetch(url)?.len() as u64)
    }
}

/// Blocking HTTP fetcher backed by `reqwest`.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("imgparity/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout(config))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

/// Whole-request deadline. `None` is passed through to the builder so it
/// replaces the blocking client's default instead of keeping it.
fn request_timeout(config: &FetchConfig) -> Option<Duration> {
    config.timeout_secs.map(Duration::from_secs)
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;
        tracing::trace!(url = %url, size = body.len(), "Fetched");
        Ok(body.to_vec())
    }
}
