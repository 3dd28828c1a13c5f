//! Markdown rendering.
//!
//! A [`MarkdownRenderer`] turns markdown source into a pulldown-cmark event
//! stream. The base renderer is [`CmarkRenderer`]; decorators such as
//! [`Anchored`] and [`NamedCodeBlocks`] wrap another renderer, rewrite its
//! events and expose the same interface, so they compose by chaining:
//!
//! ```ignore
//! let renderer = CmarkRenderer::new(&config)?
//!     .with_anchors(AnchorOptions::default())
//!     .with_named_code_blocks();
//! ```

mod anchor;
mod cmark;
mod named;

pub use anchor::{AnchorOptions, Anchored};
pub use cmark::CmarkRenderer;
pub use named::NamedCodeBlocks;

use pulldown_cmark::{Event, Tag, TagEnd, html};
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// A heading found in rendered markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// The heading level (1-6)
    pub level: u8,
    /// The heading text, without markup
    pub text: String,
    /// The heading id, if one was assigned
    pub id: Option<String>,
}

/// Result of rendering markdown, containing both HTML and the headings.
#[derive(Debug, Clone)]
pub struct MarkdownOutput {
    pub html: String,
    pub headings: Vec<Heading>,
}

/// Something that can turn markdown into an event stream.
pub trait MarkdownRenderer: Send + Sync {
    /// Parse `source` into the events that will be written as HTML.
    fn events<'a>(&self, source: &'a str) -> Result<Vec<Event<'a>>, MarkdownError>;

    /// Render `source` to HTML, collecting headings along the way.
    fn render(&self, source: &str) -> Result<MarkdownOutput, MarkdownError> {
        let events = self.events(source)?;
        let headings = collect_headings(&events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(MarkdownOutput {
            html: html_output,
            headings,
        })
    }
}

impl<R: MarkdownRenderer + ?Sized> MarkdownRenderer for Box<R> {
    fn events<'a>(&self, source: &'a str) -> Result<Vec<Event<'a>>, MarkdownError> {
        (**self).events(source)
    }
}

/// Chaining helpers for wrapping a renderer in decorators.
pub trait MarkdownRendererExt: MarkdownRenderer + Sized {
    /// Give headings ids and, if configured, permalink anchors.
    fn with_anchors(self, options: AnchorOptions) -> Anchored<Self> {
        Anchored::new(self, options)
    }

    /// Label fenced code blocks written as ```` ```lang:name ````.
    fn with_named_code_blocks(self) -> NamedCodeBlocks<Self> {
        NamedCodeBlocks::new(self)
    }
}

impl<R: MarkdownRenderer> MarkdownRendererExt for R {}

/// Walk an event stream and record every heading with its plain text.
fn collect_headings(events: &[Event]) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut current: Option<Heading> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some(Heading {
                    level: *level as u8,
                    text: String::new(),
                    id: id.as_ref().map(|id| id.to_string()),
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(mut heading) = current.take() {
                    heading.text = heading.text.trim().to_string();
                    headings.push(heading);
                }
            }
            _ => {}
        }
    }

    headings
}
