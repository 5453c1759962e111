//! Crawl state: the visited set and frontier bookkeeping
//!
//! A `CrawlState` belongs to exactly one crawl. Only the coordinator mutates
//! it, and the visited set is insert-only.

use crate::url::{canonical_key, root_origin};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

/// URLs scheduled for fetching in the current depth pass, in discovery order
pub type Frontier = Vec<Url>;

/// Mutable state of one crawl invocation
#[derive(Debug)]
pub struct CrawlState {
    root: Url,
    root_origin: String,
    visited: HashSet<String>,
    output_dir: PathBuf,
}

impl CrawlState {
    /// Creates the state for a crawl rooted at `root`, which is marked visited
    pub fn new(root: Url, output_dir: impl Into<PathBuf>) -> Self {
        let mut visited = HashSet::new();
        visited.insert(canonical_key(&root));

        Self {
            root_origin: root_origin(&root),
            root,
            visited,
            output_dir: output_dir.into(),
        }
    }

    /// The root URL as it is fetched
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Scheme, host and port of the root, e.g. `https://example.com`
    pub fn root_origin(&self) -> &str {
        &self.root_origin
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The initial frontier: just the root
    pub fn seed(&self) -> Frontier {
        vec![self.root.clone()]
    }

    /// Filters a batch of candidates down to the ones never seen before
    ///
    /// URLs are compared by canonical key. The key of every returned URL is
    /// added to the visited set before returning, in input order. When several
    /// candidates share a key only the first is returned, in the form it was
    /// linked, so `/docs/` is fetched as `/docs/` and not as `/docs`.
    pub fn mark_and_filter(&mut self, urls: Vec<Url>) -> Frontier {
        urls.into_iter()
            .filter(|url| self.visited.insert(canonical_key(url)))
            .collect()
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(&canonical_key(url))
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Snapshot of the visited keys, sorted for stable output
    pub fn visited_sorted(&self) -> Vec<String> {
        let mut visited: Vec<String> = self.visited.iter().cloned().collect();
        visited.sort();
        visited
    }
}
