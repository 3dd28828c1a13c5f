//! Path and URL conversion utilities.
//!
//! This module handles conversions between:
//! - Source file paths (relative to the input directory)
//! - URL paths (the URL at which a page will be served)
//! - Output file paths (where files are written in the output directory)

use std::path::{Path, PathBuf};

use super::document::{Document, Permalink};

/// Convert a content file path to its default URL.
///
/// # Examples
/// ```ignore
/// source_path_to_url("about.md") => "/about/"
/// source_path_to_url("posts/hello.md") => "/posts/hello/"
/// source_path_to_url("index.md") => "/"
/// source_path_to_url("posts/index.tera") => "/posts/"
/// ```
pub fn source_path_to_url(path: &Path) -> String {
    let path_str = path.with_extension("").to_string_lossy().replace('\\', "/");

    // Index files become the directory URL
    let path_str = if path_str == "index" {
        ""
    } else {
        path_str.strip_suffix("/index").unwrap_or(&path_str)
    };

    if path_str.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", path_str)
    }
}

/// Normalize a front matter permalink: leading slash, no duplicate slashes.
///
/// ```ignore
/// normalize_permalink("about/") => "/about/"
/// normalize_permalink("/feed.json") => "/feed.json"
/// ```
pub fn normalize_permalink(permalink: &str) -> String {
    let segments: Vec<&str> = permalink.split('/').filter(|s| !s.is_empty()).collect();
    let mut url = format!("/{}", segments.join("/"));
    if permalink.ends_with('/') && url.len() > 1 {
        url.push('/');
    }
    url
}

/// The URL a document is written to, or `None` for `permalink: false`.
pub fn document_url(doc: &Document) -> Option<String> {
    match &doc.front_matter.permalink {
        Some(Permalink::Disabled(false)) => None,
        Some(Permalink::Path(permalink)) => Some(normalize_permalink(permalink)),
        Some(Permalink::Disabled(true)) | None => Some(source_path_to_url(&doc.source_path)),
    }
}

/// Convert a URL path to an output file path.
///
/// URLs ending in a slash become `path/index.html`; URLs naming a file
/// with an extension are written as-is; anything else gets `/index.html`.
///
/// # Examples
/// ```ignore
/// url_to_output_path("/about/", output_dir) => output_dir/about/index.html
/// url_to_output_path("/", output_dir) => output_dir/index.html
/// url_to_output_path("/feed.json", output_dir) => output_dir/feed.json
/// ```
pub fn url_to_output_path(url_path: &str, output_dir: &Path) -> PathBuf {
    let trimmed = url_path.trim_matches('/');

    if trimmed.is_empty() {
        output_dir.join("index.html")
    } else if url_path.ends_with('/') {
        output_dir.join(trimmed).join("index.html")
    } else if Path::new(trimmed).extension().is_some() {
        output_dir.join(trimmed)
    } else {
        output_dir.join(trimmed).join("index.html")
    }
}
