//! Pipeline error types.

use crate::build::render::RenderError;
use crate::markdown::MarkdownError;

/// Errors that can occur during pipeline processing.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("template error: {0}")]
    Template(#[from] RenderError),

    #[error("markdown rendering error: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no stage named '{0}' in pipeline")]
    UnknownStage(String),

    #[error("stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },
}

impl PipelineError {
    /// Create a stage-specific error.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}
