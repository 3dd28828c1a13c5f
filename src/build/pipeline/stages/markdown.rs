//! Markdown rendering stage.

use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Stage that renders markdown documents to HTML with the site's composed
/// renderer.
///
/// After this stage, `doc.content` of every markdown document contains
/// HTML and `doc.headings` contains the headings it found. Other formats
/// are already HTML and are left alone.
pub struct MarkdownStage;

impl Stage for MarkdownStage {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs.iter_mut().filter(|d| d.doc.is_markdown()) {
            let output = ctx.markdown.render(&doc.content).map_err(|e| {
                PipelineError::stage(
                    "markdown",
                    format!("failed to render {}: {}", doc.display_name(), e),
                )
            })?;

            doc.content = output.html;
            doc.headings = output.headings;
        }

        Ok(())
    }
}
