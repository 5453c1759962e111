//! Markdown summary generation
//!
//! Renders a crawl report as a markdown file that can be kept next to the
//! mirrored site.

use crate::output::stats::CrawlReport;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of the crawl to `output_path`
pub fn generate_markdown_summary(report: &CrawlReport, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_summary(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_summary(report: &CrawlReport) -> String {
    let mut md = String::new();

    md.push_str("# Sumi-Mirror Crawl Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Root**: {}\n", report.root));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    if let Some(finished) = &report.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = report.duration_seconds() {
        md.push_str(&format!("- **Duration**: {:.1} seconds\n", duration));
    }
    let status = if report.cancelled {
        "Stopped early"
    } else {
        "Completed"
    };
    md.push_str(&format!("- **Status**: {}\n\n", status));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Depth Passes**: {}\n", report.passes));
    md.push_str(&format!("- **URLs Visited**: {}\n", report.visited.len()));
    md.push_str(&format!("- **Pages Fetched**: {}\n", report.pages_fetched));
    md.push_str(&format!("- **Files Written**: {}\n", report.files.len()));
    md.push_str(&format!("- **Bytes Written**: {}\n", report.bytes_written));
    md.push_str(&format!(
        "- **In-Scope Links Found**: {}\n\n",
        report.links_discovered
    ));

    if !report.failures.is_empty() {
        md.push_str("## Failures\n\n");
        md.push_str("| Kind | URL | Error |\n");
        md.push_str("|------|-----|-------|\n");
        for failure in &report.failures {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                failure.kind,
                failure.url,
                failure.message.replace('|', "\\|")
            ));
        }
        md.push('\n');
    }

    md.push_str("## Files\n\n");
    for path in &report.files {
        md.push_str(&format!("- `{}`\n", path.display()));
    }

    md
}
