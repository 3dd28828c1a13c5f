//! Named code blocks.
//!
//! A fence written as ```` ```rust:src/main.rs ```` is rendered as a regular
//! `rust` code block wrapped in a container that shows the file name.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};

use super::{MarkdownError, MarkdownRenderer};
use crate::util::escape_html;

/// Decorator labelling `lang:name` code fences with their name.
pub struct NamedCodeBlocks<R> {
    inner: R,
}

impl<R> NamedCodeBlocks<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: MarkdownRenderer> MarkdownRenderer for NamedCodeBlocks<R> {
    fn events<'a>(&self, source: &'a str) -> Result<Vec<Event<'a>>, MarkdownError> {
        let events = self.inner.events(source)?;
        let mut output = Vec::with_capacity(events.len());
        let mut in_named_block = false;

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    match split_info(&info) {
                        Some((info, name)) => {
                            in_named_block = true;
                            output.push(Event::Html(
                                format!(
                                    "<div class=\"named-fence-block\"><div class=\"named-fence-filename\">{}</div>\n",
                                    escape_html(&name)
                                )
                                .into(),
                            ));
                            output.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(
                                info.into(),
                            ))));
                        }
                        None => output.push(Event::Start(Tag::CodeBlock(
                            CodeBlockKind::Fenced(info),
                        ))),
                    }
                }
                Event::End(TagEnd::CodeBlock) if in_named_block => {
                    in_named_block = false;
                    output.push(Event::End(TagEnd::CodeBlock));
                    output.push(Event::Html("</div>\n".into()));
                }
                other => output.push(other),
            }
        }

        Ok(output)
    }
}

/// Split a `lang:name rest` info string into (`lang rest`, `name`).
///
/// Returns `None` when the first word has no `:` or either side is empty.
fn split_info(info: &CowStr) -> Option<(String, String)> {
    let info = info.trim();
    let (first, rest) = match info.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, Some(rest)),
        None => (info, None),
    };

    let (lang, name) = first.split_once(':')?;
    if lang.is_empty() || name.is_empty() {
        return None;
    }

    let info = match rest {
        Some(rest) => format!("{} {}", lang, rest.trim()),
        None => lang.to_string(),
    };
    Some((info, name.to_string()))
}
