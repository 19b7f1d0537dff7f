use std::path::PathBuf;
use url::Url;

/// Longest single path component written to disk
const MAX_COMPONENT_LEN: usize = 100;

/// File name used for directory-like URLs
pub const INDEX_FILE: &str = "index.html";

/// Convert a string to something safe to use as one path component
pub fn sanitize_filename(component: &str) -> String {
    let mut name = component.replace(['/', '\\', ':', '?', '&', '=', '#', '%', '*', '"', '<', '>', '|'], "_");
    if name.is_empty() || name == "." || name == ".." {
        name = "_".repeat(name.len().max(1));
    }

    // Limit filename length
    if name.chars().count() > MAX_COMPONENT_LEN {
        name.chars().take(MAX_COMPONENT_LEN).collect()
    } else {
        name
    }
}

/// Relative location of a page in a mirror directory: `<host>/<path>`.
///
/// Only a last segment with a file extension is written as a file. Any other
/// path is treated as a directory holding `index.html`, so `/docs` and
/// `/docs/intro` can both be mirrored. A query is folded into the file name so
/// `?page=2` does not overwrite `?page=1`.
pub fn mirror_path(url: &Url) -> PathBuf {
    let host = match url.port() {
        Some(port) => format!("{}:{}", url.host_str().unwrap_or("unknown_host"), port),
        None => url.host_str().unwrap_or("unknown_host").to_string(),
    };
    let mut path = PathBuf::from(sanitize_filename(&host));

    let mut segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
    let file = match segments.last() {
        Some(last) if has_extension(last) => segments.pop().map(str::to_string),
        _ => None,
    };
    for dir in segments {
        path.push(sanitize_filename(dir));
    }

    let query = url.query().filter(|query| !query.is_empty());
    let file = match (file, query) {
        (Some(file), Some(query)) => format!("{}_{}", file, query),
        (Some(file), None) => file,
        (None, Some(query)) => format!("index_{}.html", query),
        (None, None) => INDEX_FILE.to_string(),
    };
    path.push(sanitize_filename(&file));
    path
}

fn has_extension(segment: &str) -> bool {
    segment
        .rsplit_once('.')
        .is_some_and(|(stem, extension)| !stem.is_empty() && !extension.is_empty())
}
