//! Configuration type definitions.
//!
//! This module contains the data structures read from `quire.yaml`.
//! These types are pure data - no I/O or complex logic.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Project configuration
// =============================================================================

/// Everything a project can tune without touching code.
///
/// The directory conventions and registered plugins are fixed by
/// `site::assemble`; this file only supplies metadata and plugin options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub site: SiteMetadata,
    /// Output directory, relative to the project root
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    /// Development-specific settings (watch mode, etc.)
    #[serde(default)]
    pub dev: DevConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            site: SiteMetadata::default(),
            output: default_output(),
            markdown: MarkdownConfig::default(),
            highlight: HighlightConfig::default(),
            feed: FeedConfig::default(),
            dev: DevConfig::default(),
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("_site")
}

// =============================================================================
// Site metadata
// =============================================================================

/// Site-wide metadata, available in templates as `site.*`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteMetadata {
    #[serde(default = "default_title")]
    pub title: String,
    /// Absolute base URL, used for feed links
    pub url: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_title() -> String {
    "Untitled Site".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for SiteMetadata {
    fn default() -> Self {
        Self {
            title: default_title(),
            url: None,
            description: None,
            author: None,
            language: default_language(),
        }
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
    /// Pass raw HTML in markdown through; escaped as text when off
    #[serde(default)]
    pub html: bool,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "footnotes".to_string(),
        "heading_attributes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
            html: false,
        }
    }
}

// =============================================================================
// Plugin options
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Theme used when generating the highlight stylesheet
    #[serde(default = "default_highlight_theme")]
    pub theme: String,
    /// Output path for the theme stylesheet; no stylesheet is written if unset
    pub stylesheet: Option<String>,
}

fn default_highlight_theme() -> String {
    "dracula".to_string()
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: default_highlight_theme(),
            stylesheet: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Where the feed is written, relative to the output directory
    #[serde(default = "default_feed_path")]
    pub path: String,
    /// Tag whose documents make up the feed; `all` takes every dated page
    #[serde(default = "default_feed_collection")]
    pub collection: String,
    /// Maximum number of entries
    #[serde(default = "default_feed_limit")]
    pub limit: usize,
    /// Feed title (defaults to the site title)
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

fn default_feed_path() -> String {
    "/feed.xml".to_string()
}

fn default_feed_collection() -> String {
    "posts".to_string()
}

fn default_feed_limit() -> usize {
    20
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            path: default_feed_path(),
            collection: default_feed_collection(),
            limit: default_feed_limit(),
            title: None,
            subtitle: None,
        }
    }
}

// =============================================================================
// Development configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    /// File watching configuration
    #[serde(default)]
    pub watch: WatchConfig,
    /// Enable live reload in the browser when files change (default: true)
    #[serde(default = "default_live_reload")]
    pub live_reload: bool,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            watch: WatchConfig::default(),
            live_reload: true,
        }
    }
}

fn default_live_reload() -> bool {
    true
}

/// Configuration for file watching during development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Use polling-based watcher instead of native file system events.
    /// Useful for network filesystems, Docker volumes, or other situations
    /// where native events are unreliable.
    #[serde(default)]
    pub poll: bool,
    /// Poll interval in milliseconds (only used if poll=true).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Debounce timeout in milliseconds.
    /// Changes within this window are batched together.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll: false,
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}
