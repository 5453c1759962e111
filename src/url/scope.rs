use crate::UrlError;
use url::Url;

/// A discovered href after resolution against the page it was found on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Absolute URL as linked, fragment removed. This is what gets fetched;
    /// [`canonical_key`](crate::url::canonical_key) gives its visited-set key.
    pub url: Url,

    /// Whether the link shares the crawl root's origin
    pub in_scope: bool,
}

/// Resolves a discovered href and decides whether the crawl follows it
///
/// Relative hrefs are joined onto `base` (the page the link was found on),
/// so `/a`, `a` and `https://root/a` all become the same absolute URL before
/// any comparison. A link is in scope when its origin (scheme, host and
/// port) equals the origin of `root`.
///
/// Out-of-scope links are returned with `in_scope = false` rather than as
/// errors: other hosts, non-HTTP schemes such as `mailto:` or
/// `javascript:`, and fragment-only anchors (`#top`).
///
/// # Errors
///
/// `UrlError::InvalidLink` when the href is empty or cannot be parsed.
///
/// # Examples
///
/// ```
/// use sumi_mirror::url::resolve;
/// use url::Url;
///
/// let root = Url::parse("https://example.com/").unwrap();
/// let link = resolve(&root, &root, "/about/#team").unwrap();
/// assert!(link.in_scope);
/// assert_eq!(link.url.as_str(), "https://example.com/about/");
///
/// let link = resolve(&root, &root, "mailto:hi@example.com").unwrap();
/// assert!(!link.in_scope);
/// ```
pub fn resolve(root: &Url, base: &Url, href: &str) -> Result<ResolvedLink, UrlError> {
    let href = href.trim();

    if href.is_empty() {
        return Err(UrlError::InvalidLink(href.to_string()));
    }

    let joined = base
        .join(href)
        .map_err(|_| UrlError::InvalidLink(href.to_string()))?;

    // Same-page anchors never name a new resource
    if href.starts_with('#') {
        return Ok(out_of_scope(joined));
    }

    if joined.scheme() != "http" && joined.scheme() != "https" {
        return Ok(out_of_scope(joined));
    }

    if joined.origin() != root.origin() {
        return Ok(out_of_scope(joined));
    }

    let mut url = joined;
    url.set_fragment(None);

    Ok(ResolvedLink {
        url,
        in_scope: true,
    })
}

fn out_of_scope(mut url: Url) -> ResolvedLink {
    url.set_fragment(None);
    ResolvedLink {
        url,
        in_scope: false,
    }
}

/// Returns the ASCII serialization of a URL's origin, e.g. `https://example.com:8080`
pub fn root_origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}
