use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tera::{Context, Tera};

use super::document::Document;
use crate::site::HelperRegistry;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("layout not found in includes directory: {0}")]
    LayoutNotFound(String),
}

/// The template renderer, wrapping Tera.
pub struct Renderer {
    tera: Tera,
    /// Whether the includes directory provides `macros.html`
    has_macros: bool,
}

impl Renderer {
    /// Create a renderer loading templates from the includes directory.
    ///
    /// A missing includes directory is fine: content can still use Tera
    /// syntax, it just can't extend or include anything.
    pub fn new(includes_dir: &Path, helpers: &HelperRegistry) -> Result<Self, RenderError> {
        let mut tera = if includes_dir.is_dir() {
            let glob = includes_dir.join("**/*.{html,tera}");
            Tera::new(&glob.to_string_lossy())?
        } else {
            Tera::default()
        };
        helpers.register_into(&mut tera);

        let has_macros = tera.get_template_names().any(|name| name == "macros.html");

        Ok(Self { tera, has_macros })
    }

    /// Render a layout with the given context.
    ///
    /// `layout` may omit the extension: `base` finds `base.html` or `base.tera`.
    pub fn render_layout(&self, layout: &str, context: &Context) -> Result<String, RenderError> {
        let name = [
            layout.to_string(),
            format!("{layout}.html"),
            format!("{layout}.tera"),
        ]
        .into_iter()
        .find(|candidate| self.tera.get_template_names().any(|name| name == candidate))
        .ok_or_else(|| RenderError::LayoutNotFound(layout.to_string()))?;

        Ok(self.tera.render(&name, context)?)
    }

    /// Render raw content through Tera before markdown processing.
    ///
    /// The content is added as a temporary template, so it can extend and
    /// include templates from the includes directory. When `macros.html`
    /// exists its macros are available as `macros::name(...)`.
    pub fn render_content(&mut self, content: &str, context: &Context) -> Result<String, RenderError> {
        let content = if self.has_macros {
            format!("{{% import \"macros.html\" as macros %}}\n{}", content)
        } else {
            content.to_string()
        };

        // The name has no .html suffix, so Tera won't autoescape content
        const TEMP_TEMPLATE_NAME: &str = "__content_render__";
        self.tera.add_raw_template(TEMP_TEMPLATE_NAME, &content)?;

        let result = self.tera.render(TEMP_TEMPLATE_NAME, context);

        // Clean up the temporary template
        self.tera.templates.remove(TEMP_TEMPLATE_NAME);

        Ok(result?)
    }
}

/// Information about the current page, available as `page.*`.
#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub title: String,
    /// Output URL; absent when the page isn't written
    pub url: Option<String>,
    /// Date as written in front matter, for `formatted_date`
    pub date: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Source path relative to the input directory
    pub input_path: String,
    /// Custom front matter fields (flattened to top level, e.g., `page.author`)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl PageInfo {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            title: doc.title(),
            url: doc.url.clone(),
            date: doc.front_matter.date.clone(),
            description: doc.front_matter.description.clone(),
            tags: doc.front_matter.tags.clone(),
            input_path: doc.source_path.to_string_lossy().replace('\\', "/"),
            extra: doc.front_matter.extra.clone(),
        }
    }
}

/// A table of contents entry for the current page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// The heading text
    pub text: String,
    /// The heading id (for anchor links)
    pub id: String,
    /// The heading level (1-6)
    pub level: u8,
}
