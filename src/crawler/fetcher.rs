//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests with bounded, logged redirect following
//! - Lenient Content-Type parsing
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::FetchError;
use mime::Mime;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// A successfully fetched resource
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code (always 2xx)
    pub status_code: u16,

    /// Parsed Content-Type, `None` when missing or malformed
    pub content_type: Option<Mime>,

    /// Response body
    pub body: Vec<u8>,
}

impl FetchResult {
    /// Returns true if the body should be handed to the link extractor
    ///
    /// Unknown content types are treated as HTML.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            None => true,
            Some(mime) => {
                (mime.type_() == mime::TEXT && mime.subtype() == mime::HTML)
                    || mime.essence_str() == "application/xhtml+xml"
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed up to `max_redirects` hops. Each target is the
/// `Location` header parsed by `url::Url`, which keeps existing
/// percent-escapes such as `%20` as they are instead of escaping them again.
///
/// # Example
///
/// ```no_run
/// use sumi_mirror::config::{CrawlerConfig, UserAgentConfig};
/// use sumi_mirror::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(redirect_policy(crawler.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

fn redirect_policy(max_redirects: usize) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            return attempt.error(format!("too many redirects (limit {})", max_redirects));
        }
        if attempt.previous().contains(attempt.url()) {
            let message = format!("redirect loop at {}", attempt.url());
            return attempt.error(message);
        }
        tracing::debug!(
            "Following redirect {} -> {}",
            attempt.previous().last().map(Url::as_str).unwrap_or(""),
            attempt.url()
        );
        attempt.follow()
    })
}

/// Performs single GETs for the crawler
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from configuration
    pub fn from_config(
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(crawler, user_agent)?))
    }

    /// Fetches a URL, following redirects
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Request timeout | `FetchError::Timeout` |
    /// | Connection failure, redirect limit or loop | `FetchError::Network` |
    /// | Non-2xx status after redirects | `FetchError::Status` |
    /// | Body read failure | `FetchError::Body` |
    ///
    /// A missing or malformed Content-Type is not an error.
    pub async fn fetch(&self, url: &Url) -> Result<FetchResult, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = parse_content_type(response.headers().get(CONTENT_TYPE));
        if content_type.is_none() {
            tracing::debug!("No usable Content-Type for {}", url);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| {
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
            })?
            .to_vec();

        Ok(FetchResult {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        })
    }
}

fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Parses a Content-Type header value, ignoring anything unusable
pub fn parse_content_type(value: Option<&HeaderValue>) -> Option<Mime> {
    value?.to_str().ok()?.trim().parse::<Mime>().ok()
}
