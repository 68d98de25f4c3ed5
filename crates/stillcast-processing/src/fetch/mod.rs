//! Bounded retrieval of remote images into staged inputs.
//!
//! Two acquisition strategies implement the same [`ImageFetcher`] contract:
//! [`BufferedFetcher`] reads the whole payload into memory first, while
//! [`StreamingFetcher`] writes chunk by chunk and aborts the transfer the
//! moment the byte cap is exceeded. Both enforce the declared-length fast
//! reject, the content-type/extension policy, and partial-file removal on
//! every failure path.

mod buffered;
mod streamed;

pub use buffered::BufferedFetcher;
pub use streamed::StreamingFetcher;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client, Response, StatusCode};

use stillcast_core::FetchStrategy;

use crate::policy::{self, ImageKind, PolicyError};
use crate::staged::StagedInput;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid source URL: {0}")]
    InvalidUrl(String),

    #[error("Download timed out")]
    Timeout,

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("Download failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("URL returned status code {0}")]
    UpstreamStatus(StatusCode),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("Declared content length {declared} bytes exceeds limit of {limit} bytes")]
    DeclaredTooLarge { declared: u64, limit: u64 },

    #[error("Download exceeded limit: received {received} bytes, limit is {limit} bytes")]
    TooLarge { received: u64, limit: u64 },

    #[error("Failed to stage download: {0}")]
    Io(#[from] std::io::Error),
}

/// Retrieve a remote image into local temporary storage under the configured
/// byte/time/redirect caps.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<StagedInput, FetchError>;
}

/// HTTP client shared by both strategies; the timeout and redirect ceiling
/// live here so neither strategy can forget them.
pub fn build_client(timeout: Duration, max_redirects: usize) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .redirect(redirect::Policy::limited(max_redirects))
        .build()
}

/// Select the configured acquisition strategy.
pub fn fetcher_for(strategy: FetchStrategy, client: Client, max_bytes: u64) -> Arc<dyn ImageFetcher> {
    match strategy {
        FetchStrategy::Buffered => Arc::new(BufferedFetcher::new(client, max_bytes)),
        FetchStrategy::Streamed => Arc::new(StreamingFetcher::new(client, max_bytes)),
    }
}

fn map_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_redirect() {
        FetchError::TooManyRedirects
    } else {
        FetchError::Network(e)
    }
}

fn parse_source_url(url: &str) -> Result<reqwest::Url, FetchError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidUrl("URL is empty".to_string()));
    }

    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|_| FetchError::InvalidUrl(format!("Invalid URL format: {}", trimmed)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(FetchError::InvalidUrl(
            "Only HTTP and HTTPS URLs are allowed".to_string(),
        ));
    }

    Ok(parsed)
}

/// Send the request and run every check that does not require the body:
/// status, content-type/extension policy, declared length.
async fn begin_fetch(
    client: &Client,
    url: &str,
    max_bytes: u64,
) -> Result<(Response, ImageKind), FetchError> {
    let parsed = parse_source_url(url)?;

    let response = client
        .get(parsed.clone())
        .send()
        .await
        .map_err(map_transport_error)?;

    if !response.status().is_success() {
        return Err(FetchError::UpstreamStatus(response.status()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let kind = policy::classify_source(content_type.as_deref(), parsed.path())?;

    if let Some(declared) = response.content_length() {
        if declared > max_bytes {
            return Err(FetchError::DeclaredTooLarge {
                declared,
                limit: max_bytes,
            });
        }
    }

    Ok((response, kind))
}
