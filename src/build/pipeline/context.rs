//! Pipeline context for sharing state across stages.

use std::path::Path;

use serde::Serialize;

use crate::build::collections::Collections;
use crate::build::pipeline::ProcessingDocument;
use crate::build::render::{PageInfo, Renderer};
use crate::config::SiteMetadata;
use crate::markdown::MarkdownRenderer;
use crate::site::BuildConfig;

/// Build information exposed to templates as `quire.*`.
#[derive(Debug, Clone, Serialize)]
pub struct QuireContext {
    /// Whether this is a development build (serve mode)
    pub dev: bool,
    /// Whether pages should connect to the live reload endpoint
    pub live_reload: bool,
    pub version: String,
}

/// Shared context for pipeline stages.
///
/// Contains all resources and configuration needed by stages during processing.
pub struct PipelineContext<'a> {
    // === Output configuration ===
    /// Directory where output files are written
    pub output_dir: &'a Path,

    /// Directory conventions, engines and template formats
    pub config: &'a BuildConfig,

    // === Site-level data ===
    /// Site metadata (title, URL, author)
    pub site: &'a SiteMetadata,

    /// Global data loaded from the data directory
    pub data: &'a serde_json::Value,

    /// Documents grouped by tag
    pub collections: &'a Collections,

    // === Services ===
    /// The composed markdown renderer
    pub markdown: &'a dyn MarkdownRenderer,

    /// Template renderer (needs mutable access for render_content)
    pub renderer: &'a mut Renderer,

    // === Mode flags ===
    pub quire: QuireContext,
}

impl<'a> PipelineContext<'a> {
    /// Create a new pipeline context.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        output_dir: &'a Path,
        config: &'a BuildConfig,
        site: &'a SiteMetadata,
        data: &'a serde_json::Value,
        collections: &'a Collections,
        markdown: &'a dyn MarkdownRenderer,
        renderer: &'a mut Renderer,
        dev_mode: bool,
        live_reload: bool,
    ) -> Self {
        Self {
            output_dir,
            config,
            site,
            data,
            collections,
            markdown,
            renderer,
            quire: QuireContext {
                dev: dev_mode,
                live_reload: dev_mode && live_reload,
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Build the Tera context for rendering a document.
    ///
    /// Available variables: `site`, `page`, `data`, `collections`, `toc`
    /// and `quire`. The layout stage adds `content`.
    pub fn template_context(&self, doc: &ProcessingDocument) -> tera::Context {
        let mut context = tera::Context::new();
        context.insert("site", self.site);
        context.insert("page", &PageInfo::from_document(&doc.doc));
        context.insert("data", self.data);
        context.insert("collections", self.collections);
        context.insert("toc", &doc.toc);
        context.insert("quire", &self.quire);
        context
    }
}
