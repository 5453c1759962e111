//! Sumi-Mirror: a recursive site mirroring crawler
//!
//! This crate fetches a root page, stores it on disk, extracts its links and
//! walks every same-origin link breadth-first up to a bounded depth, never
//! fetching the same canonical URL twice.

pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Sumi-Mirror operations
///
/// Only startup problems and a failed root fetch surface as this error.
/// Everything that goes wrong on a single frontier node is recorded in the
/// crawl report instead.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Invalid root URL '{url}': {reason}")]
    InvalidRootUrl { url: String, reason: String },

    #[error("Cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to fetch root URL {url}: {source}")]
    RootFetch { url: String, source: FetchError },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Invalid link: '{0}'")]
    InvalidLink(String),

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Errors from a single HTTP fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("fetch of {url} cancelled")]
    Cancelled { url: String },
}

/// Error writing a fetched resource to disk
#[derive(Debug, Error)]
#[error("failed to write {}: {source}", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

/// Errors from the link extractor
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("body is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("invalid selector: {0}")]
    Selector(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, DepthBudget};
pub use output::CrawlReport;
pub use crate::url::{canonical_key, canonicalize, parse_http_url, resolve, ResolvedLink};
