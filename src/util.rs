//! Shared utility functions.

use std::path::{Component, Path, PathBuf};

/// Convert a slug to title case.
///
/// Splits on `-` and `_`, capitalizes each word.
/// "getting-started" -> "Getting Started"
/// "api_reference" -> "Api Reference"
pub fn title_case(s: &str) -> String {
    s.split(['-', '_'])
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// Leading `..` components of a relative path are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Reverse `escape_html`, plus the numeric apostrophe some writers emit.
pub fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("getting-started"), "Getting Started");
        assert_eq!(title_case("installation"), "Installation");
        assert_eq!(title_case("api_reference"), "Api Reference");
        assert_eq!(title_case("README"), "README");
        assert_eq!(title_case("my-cool-feature"), "My Cool Feature");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("./_site")), PathBuf::from("_site"));
        assert_eq!(normalize_path(Path::new("src/..")), PathBuf::new());
        assert_eq!(normalize_path(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize_path(Path::new("../out")), PathBuf::from("../out"));
        assert_eq!(normalize_path(Path::new("/project/../..")), PathBuf::from("/"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(escape_html("<div>&</div>"), "&lt;div&gt;&amp;&lt;/div&gt;");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let original = "if a < b && c > \"d\" { 'e' }";
        assert_eq!(unescape_html(&escape_html(original)), original);
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
    }
}
