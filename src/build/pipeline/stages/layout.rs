//! Layout rendering stage.
//!
//! Wraps rendered content in the layout named by the document's front
//! matter, looked up in the includes directory.

use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Stage that applies layout templates to rendered content.
///
/// The layout sees every variable the content did, plus `content` holding
/// the rendered body (use `{{ content | safe }}` in HTML layouts).
/// Documents without a layout are written as they are.
///
/// After this stage, `doc.output_html` contains the complete page.
pub struct LayoutStage;

impl Stage for LayoutStage {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            let html = match doc.doc.front_matter.layout.as_deref() {
                Some(layout) => {
                    let mut context = ctx.template_context(doc);
                    context.insert("content", &doc.content);
                    ctx.renderer.render_layout(layout, &context).map_err(|e| {
                        PipelineError::stage(
                            "layout",
                            format!("failed to render {}: {}", doc.display_name(), e),
                        )
                    })?
                }
                None => doc.content.clone(),
            };

            doc.output_html = Some(html);
        }

        Ok(())
    }
}
