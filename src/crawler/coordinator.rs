//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the breadth-first driver that:
//! - Seeds the frontier with the root URL
//! - Runs one depth pass at a time over a bounded worker pool
//! - Coordinates fetching, storing and link extraction per node
//! - Dedups discovered links against the visited set between passes
//! - Honors an overall deadline and external cancellation

use crate::config::{Config, Layout};
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::frontier::{CrawlState, Frontier};
use crate::crawler::parser::{HtmlLinkExtractor, LinkExtractor};
use crate::crawler::writer::store;
use crate::output::{CrawlReport, FailureKind};
use crate::url::{parse_http_url, resolve};
use crate::{ExtractError, FetchError, MirrorError};
use futures::stream::{self, Stream, StreamExt};
use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How many depth passes a crawl may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthBudget {
    /// At most this many passes; `Passes(0)` fetches nothing
    Passes(u32),
    /// Keep going until the frontier is empty
    Unlimited,
}

impl DepthBudget {
    /// Converts a user-facing link-hop limit into a pass budget
    ///
    /// `max_depth = 0` still fetches the root once, so the budget is one more
    /// than the hop count. `None` means unlimited.
    pub fn from_max_depth(max_depth: Option<u32>) -> Self {
        match max_depth {
            Some(depth) => Self::Passes(depth.saturating_add(1)),
            None => Self::Unlimited,
        }
    }

    fn allows(&self, passes_done: u32) -> bool {
        match self {
            Self::Passes(limit) => passes_done < *limit,
            Self::Unlimited => true,
        }
    }
}

/// A fetched frontier node waiting to be stored
#[derive(Debug)]
struct FetchedNode {
    result: FetchResult,
    links: Result<Vec<Url>, ExtractError>,
}

/// Immutable per-crawl context shared by the workers of a pass
struct PassContext<'a> {
    root: &'a Url,
    token: &'a CancellationToken,
}

/// Main crawler structure
///
/// A `Crawler` is configured once and can run any number of independent
/// crawls; each `run` owns its own `CrawlState`.
pub struct Crawler {
    fetcher: Fetcher,
    extractor: Arc<dyn LinkExtractor>,
    budget: DepthBudget,
    concurrency: usize,
    layout: Layout,
    output_dir: PathBuf,
    crawl_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl Crawler {
    /// Creates a crawler from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(MirrorError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, MirrorError> {
        let fetcher = Fetcher::from_config(&config.crawler, &config.user_agent)?;

        Ok(Self {
            fetcher,
            extractor: Arc::new(HtmlLinkExtractor),
            budget: DepthBudget::from_max_depth(config.crawler.max_depth),
            concurrency: config.crawler.concurrency.max(1),
            layout: config.crawler.layout,
            output_dir: config.output.directory.clone(),
            crawl_timeout: config.crawler.crawl_timeout_secs.map(Duration::from_secs),
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the link extractor
    pub fn with_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Overrides the pass budget derived from `max-depth`
    pub fn with_budget(mut self, budget: DepthBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Token that stops the crawl when cancelled
    ///
    /// In-flight fetches are abandoned; files already written stay on disk
    /// and the partial report is returned.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Mirrors the site rooted at `root_url` into the output directory
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl ran; per-node failures are in the report
    /// * `Err(MirrorError)` - Invalid root URL, unusable output directory, or
    ///   the root itself could not be fetched
    pub async fn run(&self, root_url: &str) -> Result<CrawlReport, MirrorError> {
        let root = parse_http_url(root_url).map_err(|e| MirrorError::InvalidRootUrl {
            url: root_url.to_string(),
            reason: e.to_string(),
        })?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| MirrorError::OutputDir {
                path: self.output_dir.clone(),
                source,
            })?;

        let token = self.cancel.child_token();
        let deadline = self.crawl_timeout.map(|timeout| {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                tracing::warn!("Crawl timeout of {:?} reached, stopping", timeout);
                token.cancel();
            })
        });

        let result = self.crawl(root, &token).await;

        if let Some(handle) = deadline {
            handle.abort();
        }

        result
    }

    async fn crawl(
        &self,
        root: Url,
        token: &CancellationToken,
    ) -> Result<CrawlReport, MirrorError> {
        let mut state = CrawlState::new(root, self.output_dir.clone());
        let mut report = CrawlReport::new(state.root().as_str());
        let mut frontier = state.seed();
        let mut abandoned: Vec<Url> = Vec::new();

        tracing::info!(
            "Starting crawl of {} into {} (budget: {:?}, concurrency: {})",
            state.root(),
            state.output_dir().display(),
            self.budget,
            self.concurrency
        );

        while self.budget.allows(report.passes) && !frontier.is_empty() {
            if token.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let pass = report.passes + 1;
            tracing::info!("Pass {}: fetching {} URLs", pass, frontier.len());
            report.passes = pass;

            // Outcomes arrive in frontier order and are stored one at a time,
            // so a basename shared by two URLs ends up holding the later one.
            let mut discovered = Vec::new();
            {
                let ctx = PassContext {
                    root: state.root(),
                    token,
                };
                let mut outcomes = pin!(self.run_pass(&frontier, &ctx));

                while let Some((url, outcome)) = outcomes.next().await {
                    let fetched = match outcome {
                        Ok(fetched) => fetched,
                        Err(FetchError::Cancelled { .. }) => {
                            report.cancelled = true;
                            abandoned.push(url.clone());
                            continue;
                        }
                        Err(e) => {
                            if url == state.root() {
                                return Err(MirrorError::RootFetch {
                                    url: url.to_string(),
                                    source: e,
                                });
                            }
                            tracing::warn!("Skipping {}: {}", url, e);
                            report.record_failure(url.as_str(), FailureKind::Fetch, e.to_string());
                            continue;
                        }
                    };

                    report.pages_fetched += 1;

                    match store(&fetched.result, url, state.output_dir(), self.layout).await {
                        Ok(stored) => {
                            tracing::info!(
                                "Saved {} as {} ({} bytes)",
                                url,
                                stored.path.display(),
                                stored.bytes_written
                            );
                            report.bytes_written += stored.bytes_written;
                            report.files.push(stored.path);
                        }
                        Err(e) => {
                            tracing::warn!("Could not save {}: {}", url, e);
                            report.record_failure(url.as_str(), FailureKind::Write, e.to_string());
                        }
                    }

                    match fetched.links {
                        Ok(links) => {
                            report.links_discovered += links.len() as u64;
                            discovered.extend(links);
                        }
                        Err(e) => {
                            tracing::warn!("Could not extract links from {}: {}", url, e);
                            report.record_failure(
                                url.as_str(),
                                FailureKind::Extraction,
                                e.to_string(),
                            );
                        }
                    }
                }
            }

            frontier = state.mark_and_filter(discovered);
            tracing::info!(
                "Pass {} complete: {} new URLs queued, {} visited",
                pass,
                frontier.len(),
                state.visited_count()
            );

            if report.cancelled {
                break;
            }
        }

        abandoned.extend(frontier);
        if !abandoned.is_empty() {
            tracing::info!("Stopping with {} unfetched URLs", abandoned.len());
        }

        report.remaining = abandoned.iter().map(|url| url.to_string()).collect();
        report.visited = state.visited_sorted();
        report.finished_at = Some(chrono::Utc::now());

        tracing::info!(
            "Crawl finished: {} pages fetched, {} files written in {} passes",
            report.pages_fetched,
            report.files.len(),
            report.passes
        );

        Ok(report)
    }

    /// Fetches every URL of one frontier with at most `concurrency` in flight
    ///
    /// Outcomes come back in frontier order regardless of completion order.
    fn run_pass<'a>(
        &'a self,
        frontier: &'a Frontier,
        ctx: &'a PassContext<'a>,
    ) -> impl Stream<Item = (&'a Url, Result<FetchedNode, FetchError>)> + 'a {
        stream::iter(frontier.iter())
            .map(move |url| async move { (url, self.process_node(url, ctx).await) })
            .buffered(self.concurrency)
    }

    /// Fetch and extract for a single URL
    async fn process_node(
        &self,
        url: &Url,
        ctx: &PassContext<'_>,
    ) -> Result<FetchedNode, FetchError> {
        let fetched = tokio::select! {
            biased;
            _ = ctx.token.cancelled() => Err(FetchError::Cancelled { url: url.to_string() }),
            result = self.fetcher.fetch(url) => result,
        };
        let result = fetched?;

        let links = self.discover_links(&result, ctx.root);

        Ok(FetchedNode { result, links })
    }

    /// Extracts links from a fetched page and keeps the in-scope ones
    ///
    /// Relative links resolve against the page's final URL. The result is in
    /// page order and may contain duplicates; dedup happens between passes.
    fn discover_links(&self, result: &FetchResult, root: &Url) -> Result<Vec<Url>, ExtractError> {
        if !result.is_html() {
            return Ok(Vec::new());
        }

        let links = self.extractor.extract(&result.body)?;
        let mut in_scope = Vec::with_capacity(links.len());

        for link in links {
            match resolve(root, &result.final_url, &link.href) {
                Ok(resolved) if resolved.in_scope => in_scope.push(resolved.url),
                Ok(resolved) => {
                    tracing::trace!("Out of scope: {}", resolved.url);
                }
                Err(e) => {
                    tracing::debug!("Dropping link on {}: {}", result.final_url, e);
                }
            }
        }

        Ok(in_scope)
    }
}

/// Runs a complete crawl with the given configuration
///
/// # Example
///
/// ```no_run
/// use sumi_mirror::config::Config;
/// use sumi_mirror::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Config::default();
/// config.crawler.max_depth = Some(2);
/// let report = run_crawl(&config, "https://example.com/").await?;
/// println!("{} files written", report.files.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, root_url: &str) -> Result<CrawlReport, MirrorError> {
    Crawler::new(config)?.run(root_url).await
}
