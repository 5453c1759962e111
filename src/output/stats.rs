//! Crawl report and terminal statistics
//!
//! The coordinator fills a `CrawlReport` as it goes; this module defines it
//! and renders it for humans.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Which stage of a frontier node failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The resource could not be fetched; the node contributes no links
    Fetch,
    /// The resource was fetched but not saved; its links are still followed
    Write,
    /// Links could not be extracted; the node stays visited
    Extraction,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fetch => "fetch",
            Self::Write => "write",
            Self::Extraction => "extraction",
        };
        write!(f, "{}", s)
    }
}

/// A recoverable failure isolated to one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFailure {
    pub url: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Canonical root URL
    pub root: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Depth passes that ran (fully or until cancelled)
    pub passes: u32,

    /// Resources fetched successfully
    pub pages_fetched: u64,

    /// Files written to the output directory, in write order
    pub files: Vec<PathBuf>,

    /// Total bytes written
    pub bytes_written: u64,

    /// In-scope links seen on fetched pages, duplicates included
    pub links_discovered: u64,

    /// Canonical URLs marked visited (fetched or queued), sorted
    pub visited: Vec<String>,

    /// Frontier left unfetched when the depth budget ran out or the crawl stopped
    pub remaining: Vec<String>,

    /// Per-node failures, in the order they were recorded
    pub failures: Vec<NodeFailure>,

    /// True if the crawl stopped early on cancellation or timeout
    pub cancelled: bool,
}

impl CrawlReport {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            started_at: Utc::now(),
            finished_at: None,
            passes: 0,
            pages_fetched: 0,
            files: Vec::new(),
            bytes_written: 0,
            links_discovered: 0,
            visited: Vec::new(),
            remaining: Vec::new(),
            failures: Vec::new(),
            cancelled: false,
        }
    }

    pub fn record_failure(&mut self, url: impl Into<String>, kind: FailureKind, message: String) {
        self.failures.push(NodeFailure {
            url: url.into(),
            kind,
            message,
        });
    }

    /// Number of failures per kind
    pub fn failure_counts(&self) -> HashMap<FailureKind, usize> {
        let mut counts = HashMap::new();
        for failure in &self.failures {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Wall-clock duration, if the crawl finished
    pub fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds() as f64 / 1000.0)
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_statistics(report: &CrawlReport) {
    println!("=== Mirror Statistics ===\n");

    println!("Overview:");
    println!("  Root: {}", report.root);
    println!("  Depth passes: {}", report.passes);
    println!("  URLs visited: {}", report.visited.len());
    println!("  Pages fetched: {}", report.pages_fetched);
    println!(
        "  Files written: {} ({} bytes)",
        report.files.len(),
        report.bytes_written
    );
    println!("  In-scope links found: {}", report.links_discovered);
    if let Some(seconds) = report.duration_seconds() {
        println!("  Duration: {:.1}s", seconds);
    }
    if !report.remaining.is_empty() {
        println!("  Left unfetched: {}", report.remaining.len());
    }
    if report.cancelled {
        println!("  Stopped early: cancelled or timed out");
    }
    println!();

    if !report.failures.is_empty() {
        println!("Failures ({}):", report.failures.len());
        let mut counts: Vec<_> = report.failure_counts().into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        for (kind, count) in counts {
            println!("  {}: {}", kind, count);
        }
        for failure in &report.failures {
            println!("  - [{}] {}: {}", failure.kind, failure.url, failure.message);
        }
        println!();
    }
}
