//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the identifying user agent and timeout
//! - GET requests that race against the crawl's cancellation token
//! - Error classification into [`FetchError`]

use crate::config::Config;
use reqwest::{header, redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Content type assumed when a response carries none
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Why a page could not be fetched
///
/// The display text becomes the failed node's `error` message.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed with status code {status}")]
    HttpStatus { status: u16 },

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl FetchError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Network(format!("Connection failed: {}", e))
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status_code: u16,

    /// Media type, lowercased, without parameters
    pub content_type: String,

    /// Raw `Last-Modified` header value
    pub last_modified: Option<String>,

    /// Body text; empty for non-HTML responses, which are not read
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The full configuration (user agent and fetch sections)
///
/// # Example
///
/// ```no_run
/// use sitemapper::config::Config;
/// use sitemapper::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(Duration::from_secs(config.fetch.timeout_secs))
        .connect_timeout(Duration::from_secs(config.fetch.timeout_secs.min(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Reduces a `Content-Type` header to its lowercased media type
///
/// ```
/// use sitemapper::crawler::normalize_content_type;
///
/// assert_eq!(normalize_content_type(Some("Text/HTML; charset=UTF-8")), "text/html");
/// assert_eq!(normalize_content_type(None), "text/html");
/// ```
pub fn normalize_content_type(header: Option<&str>) -> String {
    header
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

/// Fetches one page with a single GET request
///
/// A cancelled token fails the fetch with [`FetchError::Cancelled`], both
/// before the request starts and while it is in flight.
pub async fn fetch_page(
    client: &Client,
    url: &Url,
    cancel: &CancellationToken,
) -> Result<FetchedPage, FetchError> {
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        result = send(client, url) => result,
    }
}

async fn send(client: &Client, url: &Url) -> Result<FetchedPage, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(FetchError::from_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            status: status.as_u16(),
        });
    }

    let final_url = response.url().clone();
    let headers = response.headers();
    let content_type =
        normalize_content_type(headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()));
    let last_modified = headers
        .get(header::LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = if super::is_html_content_type(&content_type) {
        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e.to_string())
            }
        })?
    } else {
        String::new()
    };

    Ok(FetchedPage {
        final_url,
        status_code: status.as_u16(),
        content_type,
        last_modified,
        body,
    })
}
