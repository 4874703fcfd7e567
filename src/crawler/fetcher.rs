//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Error classification
//!
//! Fetches are never retried: a failed URL stays failed for the rest of the crawl.

use crate::config::UserAgentConfig;
use crate::state::PageState;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use thiserror::Error;

/// Errors that end the processing of a single URL
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

impl FetchError {
    /// The URL the failed request was sent to
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Network { url, .. }
            | Self::Status { url, .. }
            | Self::Body { url, .. } => url,
        }
    }

    /// Maps the error to the page state recorded for the URL
    ///
    /// | Condition | State |
    /// |-----------|-------|
    /// | HTTP 404, 410 | DeadLink |
    /// | HTTP 429 | RateLimited |
    /// | Timeout, DNS, connection refused | Unreachable |
    /// | Anything else | Failed |
    pub fn page_state(&self) -> PageState {
        match self {
            Self::Status { status: 404 | 410, .. } => PageState::DeadLink,
            Self::Status { status: 429, .. } => PageState::RateLimited,
            Self::Timeout { .. } => PageState::Unreachable,
            Self::Network { source, .. } if source.is_connect() => PageState::Unreachable,
            _ => PageState::Failed,
        }
    }
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status_code: u16,

    /// Page body content
    pub body: String,
}

impl FetchedPage {
    /// Parses the body into a navigable document tree
    ///
    /// HTML parsing is error-tolerant and always produces a tree; a body that
    /// cannot be decoded is already reported as [`FetchError::Body`].
    pub fn parse(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total time allowed for one request
///
/// # Example
///
/// ```no_run
/// use product_scout::config::UserAgentConfig;
/// use product_scout::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "ProductScout".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with a single GET request
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
///
/// # Returns
///
/// * `Ok(FetchedPage)` - 2xx response with a readable body
/// * `Err(FetchError)` - Network failure, timeout, non-2xx status or unreadable body
pub async fn fetch_url(client: &Client, url: &str) -> Result<FetchedPage, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_request_error(url, e))?;

    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Body {
                url: url.to_string(),
                source: e,
            }
        }
    })?;

    Ok(FetchedPage {
        status_code: status.as_u16(),
        body,
    })
}

fn classify_request_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::Timeout {
            url: url.to_string(),
        };
    }

    FetchError::Network {
        url: url.to_string(),
        source: error,
    }
}
