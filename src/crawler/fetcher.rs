//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the user agent and store identity baked in
//! - GET requests to fetch listing and product page markup
//! - Error classification
//!
//! The fetcher never retries; a failed fetch is reported to the coordinator,
//! which decides how much of the crawl it costs.

use crate::config::{SessionConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while fetching a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Fetch of {url} abandoned")]
    Cancelled { url: String },
}

impl FetchError {
    /// The URL whose fetch failed
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. }
            | Self::Timeout { url }
            | Self::Connect { url, .. }
            | Self::Transport { url, .. }
            | Self::Cancelled { url } => url,
        }
    }
}

/// Retrieves page markup for the crawler
///
/// Implementations carry a fixed client identity for their whole lifetime and
/// must be shareable between concurrently running fetch tasks.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the markup at `url`
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// The user agent and the store cookies are installed as default headers, so
/// every request sent through the client carries the same identity.
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `session` - The store identity sent as cookies
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use catalog_ripple::config::{SessionConfig, UserAgentConfig};
/// use catalog_ripple::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(
///     &UserAgentConfig::default(),
///     &SessionConfig::default(),
///     Duration::from_secs(30),
/// )
/// .unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    session: &SessionConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(&session.cookie_header()) {
        Ok(value) => {
            headers.insert(COOKIE, value);
        }
        Err(e) => tracing::warn!("Store cookie not sent: {}", e),
    }

    Client::builder()
        .user_agent(user_agent.header_value())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wraps an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        session: &SessionConfig,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, session, timeout)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        fetch_url(&self.client, url).await
    }
}

/// Fetches a URL and returns its body
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 2xx | body text |
/// | Other status | `FetchError::Status` |
/// | Timeout | `FetchError::Timeout` |
/// | Connection refused / TLS | `FetchError::Connect` |
/// | Anything else | `FetchError::Transport` |
pub async fn fetch_url(client: &Client, url: &Url) -> Result<String, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| classify_error(url, e))
}

fn classify_error(url: &Url, e: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if e.is_timeout() {
        FetchError::Timeout { url }
    } else if e.is_connect() {
        FetchError::Connect {
            url,
            message: e.to_string(),
        }
    } else {
        FetchError::Transport {
            url,
            message: e.to_string(),
        }
    }
}
