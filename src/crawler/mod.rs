//! Crawler module for recursive site mirroring
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with redirect handling
//! - HTML link extraction
//! - Visited-set and frontier bookkeeping
//! - Writing fetched resources to disk
//! - Breadth-first, depth-bounded crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod writer;

pub use coordinator::{run_crawl, Crawler, DepthBudget};
pub use fetcher::{build_http_client, parse_content_type, FetchResult, Fetcher};
pub use frontier::{CrawlState, Frontier};
pub use parser::{parse_links, HtmlLinkExtractor, Link, LinkExtractor};
pub use writer::{extension_for, file_name_for, store, target_path, StoredFile};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::MirrorError;

/// Runs a complete crawl operation
///
/// This is the main entry point for mirroring a site. It will:
/// 1. Validate the root URL
/// 2. Create the output directory
/// 3. Build the HTTP client
/// 4. Run depth passes until the frontier empties or the budget runs out
/// 5. Return the crawl report
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `root_url` - The URL to start from
pub async fn crawl(config: &Config, root_url: &str) -> Result<CrawlReport, MirrorError> {
    run_crawl(config, root_url).await
}
