//! Document types for pipeline processing.

use std::path::PathBuf;

use crate::build::document::Document;
use crate::build::render::TocEntry;
use crate::markdown::Heading;

/// A document being processed through the pipeline.
///
/// Wraps the discovered `Document` with mutable state that evolves
/// through pipeline stages:
///
/// 1. Initially: `content` = body without front matter
/// 2. After tera: `content` = body with Tera syntax expanded
/// 3. After markdown: `content` = HTML fragment, `headings` populated
/// 4. After layout: `output_html` = final page HTML
#[derive(Debug)]
pub struct ProcessingDocument {
    /// The discovered document (metadata and raw body)
    pub doc: Document,

    /// Content being processed. Stays the page body (no layout) once
    /// rendered, which is what feeds embed.
    pub content: String,

    /// Headings found by the markdown stage.
    pub headings: Vec<Heading>,

    /// Table of contents, filled by the table-of-contents plugin.
    pub toc: Vec<TocEntry>,

    /// Final HTML output after layout rendering.
    ///
    /// None until the layout stage populates it.
    pub output_html: Option<String>,

    /// Where the write stage put the page, if it was written.
    pub output_path: Option<PathBuf>,
}

impl ProcessingDocument {
    /// Create a new processing document from a discovered document.
    pub fn new(doc: Document) -> Self {
        let content = doc.body.clone();
        Self {
            doc,
            content,
            headings: Vec::new(),
            toc: Vec::new(),
            output_html: None,
            output_path: None,
        }
    }

    /// The document's output URL, if it is written at all.
    pub fn url(&self) -> Option<&str> {
        self.doc.url.as_deref()
    }

    /// A name for the document in logs and errors.
    pub fn display_name(&self) -> String {
        self.doc.source_path.display().to_string()
    }

    /// Get the document title.
    pub fn title(&self) -> String {
        self.doc.title()
    }
}
