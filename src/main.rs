//! Sumi-Mirror main entry point
//!
//! This is the command-line interface for the Sumi-Mirror site mirroring crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_mirror::config::{load_config_with_hash, validate, Config, Layout};
use sumi_mirror::crawler::Crawler;
use sumi_mirror::output::{generate_markdown_summary, print_statistics};
use tracing_subscriber::EnvFilter;

/// Sumi-Mirror: recursively mirror a website
///
/// Fetches the root URL, saves it, and follows every same-origin link
/// breadth-first up to the given depth, saving each resource once.
#[derive(Parser, Debug)]
#[command(name = "sumi-mirror")]
#[command(version)]
#[command(about = "Recursively mirror a website", long_about = None)]
struct Cli {
    /// Root URL to start mirroring from
    #[arg(value_name = "URL")]
    url: String,

    /// Maximum number of link hops from the root (0 = only the root). Unlimited if omitted
    #[arg(short = 'l', long = "level", value_name = "N")]
    level: Option<u32>,

    /// Directory to save files into (created if absent)
    #[arg(short = 'P', long = "directory-prefix", value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Maximum concurrent fetches per depth pass
    #[arg(short, long, value_name = "N")]
    concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Stop the whole crawl after this many seconds
    #[arg(long, value_name = "SECS")]
    crawl_timeout: Option<u64>,

    /// On-disk layout of saved files
    #[arg(long, value_enum)]
    layout: Option<Layout>,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a markdown summary of the crawl to this file
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let crawler = Crawler::new(&config).context("Failed to initialize crawler")?;

    let token = crawler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping crawl");
            token.cancel();
        }
    });

    let report = match crawler.run(&cli.url).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if let Some(path) = &cli.summary {
        generate_markdown_summary(&report, path)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        tracing::info!("Summary written to {}", path.display());
    }

    if !cli.quiet {
        print_statistics(&report);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so per-URL failures land on the error stream.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_mirror=info,warn"),
            1 => EnvFilter::new("sumi_mirror=debug,info"),
            2 => EnvFilter::new("sumi_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Layers defaults, the optional config file and command-line flags
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if cli.level.is_some() {
        config.crawler.max_depth = cli.level;
    }
    if let Some(dir) = &cli.directory {
        config.output.directory = dir.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(timeout) = cli.timeout {
        config.crawler.request_timeout_secs = timeout;
    }
    if cli.crawl_timeout.is_some() {
        config.crawler.crawl_timeout_secs = cli.crawl_timeout;
    }
    if let Some(layout) = cli.layout {
        config.crawler.layout = layout;
    }

    validate(&config).context("Invalid settings")?;

    Ok(config)
}
