//! File writing stage.
//!
//! Writes the final HTML output to the filesystem.

use crate::build::paths::url_to_output_path;
use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Script injected into pages during `serve` so they reload after rebuilds.
const LIVE_RELOAD_SCRIPT: &str = "<script>new EventSource(\"/_quire/live-reload\").addEventListener(\"reload\", () => location.reload());</script>";

/// Stage that writes rendered documents to the output directory.
///
/// This stage takes the final HTML from `doc.output_html` and writes
/// it to the appropriate location in the output directory, creating
/// any necessary parent directories. Documents with `permalink: false`
/// are rendered but not written.
pub struct WriteStage;

impl Stage for WriteStage {
    fn name(&self) -> &'static str {
        "write"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs.iter_mut() {
            let Some(url) = doc.url() else {
                tracing::debug!(document = %doc.display_name(), "permalink disabled, not writing");
                continue;
            };

            // Get the final HTML output
            let html = doc.output_html.as_ref().ok_or_else(|| {
                PipelineError::stage(
                    "write",
                    format!(
                        "document '{}' has no output HTML (was the layout stage run?)",
                        doc.display_name()
                    ),
                )
            })?;

            let html = if ctx.quire.live_reload {
                inject_live_reload(html)
            } else {
                html.clone()
            };

            // Determine output path
            let output_path = url_to_output_path(url, ctx.output_dir);

            // Create parent directories if needed
            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            std::fs::write(&output_path, html)?;
            tracing::debug!(path = %output_path.display(), "wrote page");
            doc.output_path = Some(output_path);
        }

        Ok(())
    }
}

/// Insert the live reload script before `</body>`, or append it.
fn inject_live_reload(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => format!("{}{}{}", &html[..pos], LIVE_RELOAD_SCRIPT, &html[pos..]),
        None => format!("{}{}", html, LIVE_RELOAD_SCRIPT),
    }
}
