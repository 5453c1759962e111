//! Output module for crawl reports
//!
//! This module handles:
//! - The crawl report filled in by the coordinator
//! - Printing statistics to the terminal
//! - Writing a markdown summary next to the mirror

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, CrawlReport, FailureKind, NodeFailure};
