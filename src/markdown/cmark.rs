use pulldown_cmark::{Event, Options, Parser};

use super::{MarkdownError, MarkdownRenderer};
use crate::config::MarkdownConfig;

/// The base renderer: plain pulldown-cmark with the configured extensions.
#[derive(Debug, Clone)]
pub struct CmarkRenderer {
    options: Options,
    html: bool,
}

impl CmarkRenderer {
    /// Create a renderer, rejecting extension names pulldown-cmark doesn't know.
    pub fn new(markdown_config: &MarkdownConfig) -> Result<Self, MarkdownError> {
        let mut options = Options::empty();
        for extension in &markdown_config.extensions {
            match extension.as_str() {
                "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
                "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
                "gfm" => options.insert(Options::ENABLE_GFM),
                "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
                "smart_punctuation" => options.insert(Options::ENABLE_SMART_PUNCTUATION),
                "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
                "tables" => options.insert(Options::ENABLE_TABLES),
                "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
                other => return Err(MarkdownError::InvalidExtension(other.to_string())),
            }
        }

        Ok(Self {
            options,
            html: markdown_config.html,
        })
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn events<'a>(&self, source: &'a str) -> Result<Vec<Event<'a>>, MarkdownError> {
        let parser = Parser::new_ext(source, self.options);
        if self.html {
            return Ok(parser.collect());
        }
        Ok(parser
            .map(|event| match event {
                Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
                other => other,
            })
            .collect())
    }
}
