use crate::UrlError;
use url::Url;

/// Parses an absolute `http`/`https` URL into the form that is fetched
///
/// Only the fragment is removed. The path is kept exactly as written, so a
/// directory page linked as `/docs/` is requested as `/docs/` and its
/// relative links resolve under it.
///
/// ```
/// use sumi_mirror::url::parse_http_url;
///
/// let url = parse_http_url("https://example.com/docs/#intro").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs/");
/// ```
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    check_http(&url)?;
    url.set_fragment(None);
    Ok(url)
}

/// Canonicalizes a URL string into the form used as the visited-set key
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an `http` or `https` scheme and a host
/// 3. Normalize path:
///    - Remove dot segments and empty segments
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 4. Remove fragment (everything after #)
///
/// Host case and default ports are already normalized by the parser. The
/// query string is kept verbatim: two URLs differing only by query are
/// distinct resources.
///
/// # Examples
///
/// ```
/// use sumi_mirror::url::canonicalize;
///
/// let url = canonicalize("http://EXAMPLE.COM/docs/#intro").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/docs");
/// ```
pub fn canonicalize(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize_url(url)
}

/// Canonicalizes an already parsed URL
pub fn canonicalize_url(mut url: Url) -> Result<Url, UrlError> {
    check_http(&url)?;
    normalize_in_place(&mut url);
    Ok(url)
}

/// Visited-set key of a URL
///
/// Two URLs with the same key are the same resource for the crawl, even when
/// they differ in trailing slash, fragment or dot segments.
pub fn canonical_key(url: &Url) -> String {
    let mut key = url.clone();
    normalize_in_place(&mut key);
    key.into()
}

fn check_http(url: &Url) -> Result<(), UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(())
}

fn normalize_in_place(url: &mut Url) {
    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);
    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}
