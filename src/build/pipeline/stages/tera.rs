//! Template engine stage.
//!
//! Processes Tera syntax in content before markdown rendering, for every
//! format whose configured engine is Tera.

use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};
use crate::site::TemplateEngine;

/// Stage that processes Tera syntax in content files.
///
/// This stage runs Tera on the document body, allowing content authors
/// to use:
/// - Variables: `{{ page.title }}`, `{{ data.links }}`
/// - Helpers: `{{ page.date | formatted_date }}`
/// - Control flow: `{% for post in collections.posts %}...{% endfor %}`
///
/// Documents whose format has the engine disabled pass through unchanged.
pub struct TemplateEngineStage;

impl Stage for TemplateEngineStage {
    fn name(&self) -> &'static str {
        "tera"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            if ctx.config.engine_for(&doc.doc.format) != TemplateEngine::Tera {
                continue;
            }

            let context = ctx.template_context(doc);
            let processed = ctx
                .renderer
                .render_content(&doc.content, &context)
                .map_err(|e| {
                    PipelineError::stage(
                        "tera",
                        format!("failed to render {}: {}", doc.display_name(), e),
                    )
                })?;

            doc.content = processed;
        }

        Ok(())
    }
}
