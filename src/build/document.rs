use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::util::title_case;

// =============================================================================
// Documents
// =============================================================================

/// A content file discovered in the input directory.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the input directory (e.g., "posts/hello.md")
    pub source_path: PathBuf,
    /// File extension without the dot (e.g., "md")
    pub format: String,
    /// The URL this document is written to; `None` for `permalink: false`
    pub url: Option<String>,
    /// Front matter metadata
    pub front_matter: FrontMatter,
    /// The content without the front matter block
    pub body: String,
}

impl Document {
    /// Get the document title, falling back to filename if not in front matter.
    pub fn title(&self) -> String {
        self.front_matter.title.clone().unwrap_or_else(|| {
            self.source_path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(title_case)
                .unwrap_or_else(|| "Untitled".to_string())
        })
    }

    pub fn is_markdown(&self) -> bool {
        self.format == "md"
    }
}

// =============================================================================
// Front matter
// =============================================================================

/// Where a document is written, as set in front matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Permalink {
    /// `permalink: false` renders the page without writing it
    Disabled(bool),
    Path(String),
}

/// Front matter metadata parsed from the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrontMatter {
    /// Page title (can override filename-derived title)
    pub title: Option<String>,
    /// Page description for SEO/previews
    pub description: Option<String>,
    /// Date as written; parsed on demand
    #[serde(default, deserialize_with = "deserialize_date")]
    pub date: Option<String>,
    /// Collections this document belongs to
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    /// Layout in the includes directory
    pub layout: Option<String>,
    pub permalink: Option<Permalink>,
    /// Additional arbitrary metadata (available in templates at top level, e.g., `page.author`)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

/// YAML reads `2024-01-05` as a string but `2024` as a number.
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept `tags: post` as well as `tags: [post, rust]`.
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Tags>::deserialize(deserializer)? {
        Some(Tags::One(tag)) => vec![tag],
        Some(Tags::Many(tags)) => tags,
        None => Vec::new(),
    })
}

/// Result of parsing front matter from a content file.
#[derive(Debug)]
pub struct ParsedContent {
    /// The parsed front matter (empty if none found)
    pub front_matter: FrontMatter,
    /// The content without the front matter block
    pub content: String,
}

/// Parse front matter from content.
///
/// Front matter is a YAML block delimited by `---` at the start of the file:
///
/// ```markdown
/// ---
/// title: My Page
/// tags: posts
/// ---
///
/// # Content starts here
/// ```
///
/// Returns the parsed front matter and the remaining content.
pub fn parse_front_matter(content: &str) -> ParsedContent {
    let content = content.trim_start();

    if !content.starts_with("---") {
        return ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        };
    }

    let after_opening = &content[3..];
    let Some(closing_pos) = after_opening.find("\n---") else {
        // No closing delimiter found, treat entire content as body
        return ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        };
    };

    let yaml_content = after_opening[..closing_pos].trim_start_matches('\n');

    // Skip "---" + yaml + "\n---"
    let body_start = 3 + closing_pos + 4;
    let body = if body_start < content.len() {
        content[body_start..].trim_start_matches('\n').to_string()
    } else {
        String::new()
    };

    let front_matter = if yaml_content.trim().is_empty() {
        FrontMatter::default()
    } else {
        match serde_yaml::from_str(yaml_content) {
            Ok(fm) => fm,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse front matter, using defaults");
                FrontMatter::default()
            }
        }
    };

    ParsedContent {
        front_matter,
        content: body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(path: &str) -> Document {
        Document {
            source_path: PathBuf::from(path),
            format: "md".to_string(),
            url: None,
            front_matter: FrontMatter::default(),
            body: String::new(),
        }
    }

    #[test]
    fn test_document_title_fallback() {
        assert_eq!(document("posts/getting-started.md").title(), "Getting Started");
    }

    #[test]
    fn test_document_title_from_front_matter() {
        let mut doc = document("intro.md");
        doc.front_matter.title = Some("Welcome".to_string());
        assert_eq!(doc.title(), "Welcome");
    }

    #[test]
    fn test_parse_front_matter_basic() {
        let content = r#"---
title: My Page
description: A test page
date: 2024-01-05
layout: post
---

# Hello World
"#;
        let parsed = parse_front_matter(content);
        assert_eq!(parsed.front_matter.title.as_deref(), Some("My Page"));
        assert_eq!(parsed.front_matter.description.as_deref(), Some("A test page"));
        assert_eq!(parsed.front_matter.date.as_deref(), Some("2024-01-05"));
        assert_eq!(parsed.front_matter.layout.as_deref(), Some("post"));
        assert_eq!(parsed.content.trim(), "# Hello World");
    }

    #[test]
    fn test_tags_accept_string_or_list() {
        let single = parse_front_matter("---\ntags: posts\n---\nbody");
        assert_eq!(single.front_matter.tags, vec!["posts"]);

        let many = parse_front_matter("---\ntags:\n  - posts\n  - rust\n---\nbody");
        assert_eq!(many.front_matter.tags, vec!["posts", "rust"]);
    }

    #[test]
    fn test_permalink_forms() {
        let disabled = parse_front_matter("---\npermalink: false\n---\n");
        assert_eq!(disabled.front_matter.permalink, Some(Permalink::Disabled(false)));

        let path = parse_front_matter("---\npermalink: /about/\n---\n");
        assert_eq!(
            path.front_matter.permalink,
            Some(Permalink::Path("/about/".to_string()))
        );
    }

    #[test]
    fn test_custom_fields_kept_in_extra() {
        let parsed = parse_front_matter("---\ntitle: Custom\nauthor: Jane\n---\nContent");
        assert_eq!(
            parsed.front_matter.extra.get("author"),
            Some(&serde_yaml::Value::String("Jane".to_string()))
        );
    }

    #[test]
    fn test_parse_front_matter_no_front_matter() {
        let parsed = parse_front_matter("# Just Markdown\n\nNo front matter here.");
        assert_eq!(parsed.front_matter.title, None);
        assert!(parsed.content.starts_with("# Just Markdown"));
    }

    #[test]
    fn test_parse_front_matter_empty_front_matter() {
        let parsed = parse_front_matter("---\n---\n\n# Content");
        assert_eq!(parsed.front_matter.title, None);
        assert!(parsed.content.starts_with("# Content"));
    }

    #[test]
    fn test_invalid_front_matter_falls_back_to_defaults() {
        let parsed = parse_front_matter("---\ntitle: [unclosed\n---\nBody");
        assert_eq!(parsed.front_matter.title, None);
        assert_eq!(parsed.content, "Body");
    }
}
