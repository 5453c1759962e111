//! Content writer: names fetched resources and stores them on disk

use crate::config::Layout;
use crate::crawler::fetcher::FetchResult;
use crate::WriteError;
use mime::Mime;
use std::path::{Path, PathBuf};
use url::Url;

/// File name used when the URL path ends without a segment (e.g. the root)
const INDEX_NAME: &str = "index";

/// A resource written to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub bytes_written: u64,
}

/// Writes a fetched resource into `dir` and reports how many bytes landed
///
/// The file is always created fresh; an existing file with the same name is
/// truncated. In the flat layout two URLs sharing a last path segment end up
/// in the same file and the later one wins.
pub async fn store(
    result: &FetchResult,
    source_url: &Url,
    dir: &Path,
    layout: Layout,
) -> Result<StoredFile, WriteError> {
    let path = target_path(source_url, result.content_type.as_ref(), dir, layout);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| WriteError {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    tokio::fs::write(&path, &result.body)
        .await
        .map_err(|source| WriteError {
            path: path.clone(),
            source,
        })?;

    Ok(StoredFile {
        path,
        bytes_written: result.body.len() as u64,
    })
}

/// Computes where a resource is stored for the given layout
pub fn target_path(
    source_url: &Url,
    content_type: Option<&Mime>,
    dir: &Path,
    layout: Layout,
) -> PathBuf {
    let file_name = file_name_for(source_url, content_type);

    match layout {
        Layout::Flat => dir.join(file_name),
        Layout::Mirror => {
            let mut path = dir.to_path_buf();
            if let Some(segments) = source_url.path_segments() {
                let segments: Vec<&str> = segments.collect();
                if let Some((_, parents)) = segments.split_last() {
                    path.extend(parents.iter().filter(|s| !s.is_empty()));
                }
            }
            path.join(file_name)
        }
    }
}

/// Derives a file name from the last path segment of a URL
///
/// If the segment has no extension, the preferred extension for the
/// response's media type is appended; unknown media types add nothing.
///
/// ```
/// use sumi_mirror::crawler::file_name_for;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/data").unwrap();
/// let mime: mime::Mime = "text/plain".parse().unwrap();
/// assert_eq!(file_name_for(&url, Some(&mime)), "data.txt");
/// ```
pub fn file_name_for(url: &Url, content_type: Option<&Mime>) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or(INDEX_NAME);

    if Path::new(segment).extension().is_some() {
        return segment.to_string();
    }

    match content_type.and_then(extension_for) {
        Some(ext) => format!("{}.{}", segment, ext),
        None => segment.to_string(),
    }
}

/// Returns the file extension associated with a media type
pub fn extension_for(mime: &Mime) -> Option<&'static str> {
    let preferred = match mime.essence_str() {
        "text/html" => Some("html"),
        "application/xhtml+xml" => Some("xhtml"),
        "text/plain" => Some("txt"),
        "text/css" => Some("css"),
        "text/javascript" | "application/javascript" => Some("js"),
        "application/json" => Some("json"),
        "text/xml" | "application/xml" => Some("xml"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/svg+xml" => Some("svg"),
        "application/pdf" => Some("pdf"),
        _ => None,
    };

    preferred.or_else(|| {
        mime_guess::get_mime_extensions_str(mime.essence_str())
            .and_then(|extensions| extensions.first().copied())
    })
}
