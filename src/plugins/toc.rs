//! Table of contents from rendered headings.

use std::collections::HashMap;

use tera::Value;

use super::{Plugin, PluginError, PluginHost};
use crate::build::TocEntry;
use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};
use crate::util::escape_html;

/// Keeps the headings at the configured levels as the page's `toc`.
struct TocStage {
    levels: Vec<u8>,
}

impl Stage for TocStage {
    fn name(&self) -> &'static str {
        "toc"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        _ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs.iter_mut() {
            doc.toc = doc
                .headings
                .iter()
                .filter(|h| self.levels.contains(&h.level))
                .filter_map(|h| {
                    Some(TocEntry {
                        text: h.text.clone(),
                        id: h.id.clone()?,
                        level: h.level,
                    })
                })
                .collect();
        }
        Ok(())
    }
}

/// Render entries as nested ordered lists.
///
/// A deeper entry opens a nested list inside the previous item. Entries
/// that skip levels are nested one step at a time.
pub fn render_toc(entries: &[TocEntry]) -> String {
    let Some(base) = entries.iter().map(|e| e.level).min() else {
        return String::new();
    };

    let mut html = String::from("<nav class=\"toc\"><ol>");
    // Nested lists currently open inside the outer one
    let mut depth = 0usize;

    for (i, entry) in entries.iter().enumerate() {
        let target = usize::from(entry.level - base);
        if i > 0 {
            if target > depth {
                html.push_str("<ol>");
                depth += 1;
            } else {
                html.push_str("</li>");
                while depth > target {
                    html.push_str("</ol></li>");
                    depth -= 1;
                }
            }
        }
        html.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            escape_html(&entry.id),
            escape_html(&entry.text)
        ));
    }

    html.push_str("</li>");
    for _ in 0..depth {
        html.push_str("</ol></li>");
    }
    html.push_str("</ol></nav>");
    html
}

/// Collects h2 and h3 (by default) into `toc` for templates, and provides
/// the `toc` filter: `{{ toc | toc | safe }}`.
pub struct TableOfContents {
    levels: Vec<u8>,
}

impl TableOfContents {
    pub fn new(levels: impl IntoIterator<Item = u8>) -> Self {
        Self {
            levels: levels.into_iter().collect(),
        }
    }
}

impl Default for TableOfContents {
    fn default() -> Self {
        Self::new([2, 3])
    }
}

impl Plugin for TableOfContents {
    fn name(&self) -> &'static str {
        "table-of-contents"
    }

    fn install(&self, host: &mut PluginHost) -> Result<(), PluginError> {
        if self.levels.is_empty() {
            return Err(PluginError::invalid_options(
                self.name(),
                "at least one heading level is required",
            ));
        }
        if let Some(level) = self.levels.iter().find(|l| !(1..=6).contains(*l)) {
            return Err(PluginError::invalid_options(
                self.name(),
                format!("heading levels are 1 to 6, got {level}"),
            ));
        }

        host.add_stage_after(
            "markdown",
            TocStage {
                levels: self.levels.clone(),
            },
        )?;

        host.add_helper("toc", |value: &Value, _args: &HashMap<String, Value>| {
            let entries = tera::try_get_value!("toc", "value", Vec<TocEntry>, value);
            Ok(Value::String(render_toc(&entries)))
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::pipeline::Pipeline;
    use crate::config::SiteMetadata;
    use crate::site::HelperRegistry;
    use pretty_assertions::assert_eq;

    fn entry(level: u8, id: &str) -> TocEntry {
        TocEntry {
            text: id.to_uppercase(),
            id: id.to_string(),
            level,
        }
    }

    fn install(plugin: TableOfContents) -> Result<Pipeline, PluginError> {
        let mut host = PluginHost::new(
            Pipeline::default_pipeline(),
            HelperRegistry::default(),
            SiteMetadata::default(),
        );
        plugin.install(&mut host)?;
        Ok(host.into_parts().0)
    }

    #[test]
    fn test_render_flat() {
        assert_eq!(
            render_toc(&[entry(2, "a"), entry(2, "b")]),
            "<nav class=\"toc\"><ol><li><a href=\"#a\">A</a></li><li><a href=\"#b\">B</a></li></ol></nav>"
        );
    }

    #[test]
    fn test_render_nested() {
        assert_eq!(
            render_toc(&[entry(2, "a"), entry(3, "a1"), entry(3, "a2"), entry(2, "b")]),
            "<nav class=\"toc\"><ol><li><a href=\"#a\">A</a><ol><li><a href=\"#a1\">A1</a></li><li><a href=\"#a2\">A2</a></li></ol></li><li><a href=\"#b\">B</a></li></ol></nav>"
        );
    }

    #[test]
    fn test_render_ends_nested() {
        assert_eq!(
            render_toc(&[entry(2, "a"), entry(3, "a1")]),
            "<nav class=\"toc\"><ol><li><a href=\"#a\">A</a><ol><li><a href=\"#a1\">A1</a></li></ol></li></ol></nav>"
        );
    }

    #[test]
    fn test_render_skipped_level_nests_one_step() {
        assert_eq!(
            render_toc(&[entry(2, "a"), entry(4, "deep"), entry(2, "b")]),
            "<nav class=\"toc\"><ol><li><a href=\"#a\">A</a><ol><li><a href=\"#deep\">DEEP</a></li></ol></li><li><a href=\"#b\">B</a></li></ol></nav>"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_toc(&[]), "");
    }

    #[test]
    fn test_default_levels_and_stage_position() {
        let pipeline = install(TableOfContents::default()).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["tera", "markdown", "toc", "layout", "write"]
        );
    }

    #[test]
    fn test_invalid_levels_rejected() {
        assert!(matches!(
            install(TableOfContents::new([])),
            Err(PluginError::InvalidOptions { .. })
        ));
        assert!(install(TableOfContents::new([2, 7])).is_err());
        assert!(install(TableOfContents::new([0])).is_err());
    }
}
