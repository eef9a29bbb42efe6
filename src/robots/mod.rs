//! Robots.txt handling module
//!
//! The crawl only consumes a yes/no decision per URL through
//! [`RobotsPolicy`]. The default policy, [`RobotsTxt`], is fetched once per
//! crawl from the seed's origin.

mod parser;

pub use parser::ParsedRobots;

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why a robots decision could not be made
///
/// Callers treat every error as a disallow.
#[derive(Debug, Clone, Error)]
pub enum RobotsError {
    #[error("robots.txt returned status {0}")]
    Status(u16),

    #[error("robots.txt could not be fetched: {0}")]
    Unreachable(String),
}

/// Decides whether a URL may be crawled
pub trait RobotsPolicy: Send + Sync {
    /// Returns Ok(true) if the URL may be fetched; Err means disallow
    fn is_allowed(&self, url: &Url) -> Result<bool, RobotsError>;

    /// Minimum pause between requests requested by the site
    fn crawl_delay(&self) -> Option<Duration> {
        None
    }
}

/// Robots policy backed by a fetched robots.txt file
#[derive(Debug, Clone)]
pub enum RobotsTxt {
    /// File fetched and parsed (or absent, which allows everything)
    Parsed(ParsedRobots),

    /// File could not be obtained; every check fails
    Unavailable(RobotsError),
}

impl RobotsPolicy for RobotsTxt {
    fn is_allowed(&self, url: &Url) -> Result<bool, RobotsError> {
        match self {
            RobotsTxt::Parsed(robots) => Ok(robots.is_allowed(url)),
            RobotsTxt::Unavailable(e) => Err(e.clone()),
        }
    }

    fn crawl_delay(&self) -> Option<Duration> {
        match self {
            RobotsTxt::Parsed(robots) => robots.crawl_delay(),
            RobotsTxt::Unavailable(_) => None,
        }
    }
}

/// Builds the robots.txt URL for the origin of `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    url.join("/robots.txt").ok()
}

/// Fetches robots.txt for the origin of `site`
///
/// | Response | Policy |
/// |---|---|
/// | 2xx | parsed body |
/// | 4xx | allow all |
/// | 5xx, other status, network failure | unavailable (disallow) |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `site` - Any URL on the site; only its origin is used
/// * `agent` - The crawler product token
/// * `cancel` - Aborts the request when the crawl is stopped
pub async fn fetch_robots(
    client: &Client,
    site: &Url,
    agent: &str,
    cancel: &CancellationToken,
) -> RobotsTxt {
    let Some(url) = robots_url(site) else {
        return RobotsTxt::Unavailable(RobotsError::Unreachable(format!(
            "no robots.txt location for {}",
            site
        )));
    };

    tracing::debug!("Fetching {}", url);

    let request = async {
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| RobotsError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| RobotsError::Unreachable(e.to_string()))?;
            Ok(ParsedRobots::from_content(&body, agent))
        } else if status.is_client_error() {
            tracing::debug!("{} returned {}, allowing all", url, status);
            Ok(ParsedRobots::allow_all(agent))
        } else {
            Err(RobotsError::Status(status.as_u16()))
        }
    };

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RobotsError::Unreachable("crawl cancelled".to_string())),
        result = request => result,
    };

    match result {
        Ok(robots) => {
            tracing::debug!("Loaded robots.txt rules for agent {}", robots.agent());
            RobotsTxt::Parsed(robots)
        }
        Err(e) => {
            tracing::warn!("{}; all URLs will be treated as disallowed", e);
            RobotsTxt::Unavailable(e)
        }
    }
}
