//! Heading anchors.
//!
//! Gives every heading a unique id derived from its text and, when asked,
//! appends a permalink pointing at it.

use std::collections::HashSet;

use pulldown_cmark::{CowStr, Event, HeadingLevel, Tag, TagEnd};

use super::{MarkdownError, MarkdownRenderer};
use crate::util::escape_html;

#[derive(Debug, Clone)]
pub struct AnchorOptions {
    /// Heading levels that get an id
    pub levels: Vec<u8>,
    /// Append a permalink to each heading
    pub permalink: bool,
    /// Text of the permalink
    pub symbol: String,
    /// CSS class of the permalink
    pub class: String,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            levels: (1..=6).collect(),
            permalink: false,
            symbol: "#".to_string(),
            class: "header-anchor".to_string(),
        }
    }
}

/// Decorator adding ids, and optionally permalinks, to headings.
pub struct Anchored<R> {
    inner: R,
    options: AnchorOptions,
}

impl<R> Anchored<R> {
    pub fn new(inner: R, options: AnchorOptions) -> Self {
        Self { inner, options }
    }

    fn applies_to(&self, level: HeadingLevel) -> bool {
        self.options.levels.contains(&(level as u8))
    }

    fn permalink(&self, id: &str) -> String {
        format!(
            " <a class=\"{}\" href=\"#{}\" aria-label=\"Link to this heading\">{}</a>",
            escape_html(&self.options.class),
            escape_html(id),
            escape_html(&self.options.symbol),
        )
    }
}

/// A heading being collected until its end tag arrives.
struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    body: Vec<Event<'a>>,
    text: String,
}

impl<'a> PendingHeading<'a> {
    fn push(&mut self, event: Event<'a>) {
        if let Event::Text(text) | Event::Code(text) = &event {
            self.text.push_str(text);
        }
        self.body.push(event);
    }
}

impl<R: MarkdownRenderer> MarkdownRenderer for Anchored<R> {
    fn events<'a>(&self, source: &'a str) -> Result<Vec<Event<'a>>, MarkdownError> {
        let events = self.inner.events(source)?;

        // Explicit `{#id}` attributes are reserved up front so generated ids
        // never collide with them, wherever they appear in the document.
        let mut used_ids: HashSet<String> = events
            .iter()
            .filter_map(|event| match event {
                Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
                _ => None,
            })
            .collect();

        let mut output = Vec::with_capacity(events.len());
        let mut pending: Option<PendingHeading<'a>> = None;

        for event in events {
            match (pending.take(), event) {
                (Some(heading), Event::End(TagEnd::Heading(level))) => {
                    let id = match heading.id {
                        Some(id) => id.to_string(),
                        None => unique_id(&heading.text, &mut used_ids),
                    };
                    let permalink = self.options.permalink.then(|| self.permalink(&id));

                    output.push(Event::Start(Tag::Heading {
                        level: heading.level,
                        id: Some(id.into()),
                        classes: heading.classes,
                        attrs: heading.attrs,
                    }));
                    output.extend(heading.body);
                    if let Some(permalink) = permalink {
                        output.push(Event::InlineHtml(permalink.into()));
                    }
                    output.push(Event::End(TagEnd::Heading(level)));
                }
                (Some(mut heading), event) => {
                    heading.push(event);
                    pending = Some(heading);
                }
                (
                    None,
                    Event::Start(Tag::Heading {
                        level,
                        id,
                        classes,
                        attrs,
                    }),
                ) if self.applies_to(level) => {
                    pending = Some(PendingHeading {
                        level,
                        id,
                        classes,
                        attrs,
                        body: Vec::new(),
                        text: String::new(),
                    });
                }
                (None, event) => output.push(event),
            }
        }

        Ok(output)
    }
}

/// Derive an id from heading text that hasn't been used yet in this document.
fn unique_id(text: &str, used_ids: &mut HashSet<String>) -> String {
    let mut base_id = slugify(text.trim());
    if base_id.is_empty() {
        base_id = "section".to_string();
    }

    let mut id = base_id.clone();
    let mut suffix = 1;
    while used_ids.contains(&id) {
        id = format!("{}-{}", base_id, suffix);
        suffix += 1;
    }
    used_ids.insert(id.clone());
    id
}

/// Convert a string to a slug suitable for use as an HTML id.
fn slugify(s: &str) -> String {
    s.to_lowercase()
        .replace(' ', "-")
        .replace(|c: char| !c.is_alphanumeric() && c != '-', "")
}
