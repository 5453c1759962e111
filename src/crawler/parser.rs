//! HTML link extraction
//!
//! The crawler only needs an ordered list of `(href, text)` pairs from each
//! page. `LinkExtractor` is the seam; `HtmlLinkExtractor` is the default
//! implementation on top of `scraper`.

use crate::ExtractError;
use scraper::{Html, Selector};

/// A hyperlink found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// The raw href attribute, relative or absolute
    pub href: String,

    /// Visible link text, whitespace-trimmed
    pub text: String,
}

/// Turns a fetched body into the links it contains
///
/// Implementations must be pure: no I/O beyond reading `body`, and the same
/// input always yields the same links in the same order.
pub trait LinkExtractor: Send + Sync {
    fn extract(&self, body: &[u8]) -> Result<Vec<Link>, ExtractError>;
}

/// Extracts `<a href>` links from an HTML document in document order
#[derive(Debug, Clone, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, body: &[u8]) -> Result<Vec<Link>, ExtractError> {
        let html = std::str::from_utf8(body)?;
        parse_links(html)
    }
}

/// Parses HTML content and returns every anchor with an href
///
/// # Example
///
/// ```
/// use sumi_mirror::crawler::parse_links;
///
/// let html = r#"<html><body><a href="/page"> Link </a></body></html>"#;
/// let links = parse_links(html).unwrap();
/// assert_eq!(links[0].href, "/page");
/// assert_eq!(links[0].text, "Link");
/// ```
pub fn parse_links(html: &str) -> Result<Vec<Link>, ExtractError> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse("a[href]").map_err(|e| ExtractError::Selector(format!("{:?}", e)))?;

    let links = document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let text = element
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            Some(Link {
                href: href.to_string(),
                text,
            })
        })
        .collect();

    Ok(links)
}
