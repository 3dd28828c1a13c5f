//! Build pipeline for document processing.
//!
//! The pipeline transforms documents through a series of stages:
//! 1. Template engine processing (Tera syntax in content)
//! 2. Markdown rendering (to HTML, collecting headings)
//! 3. Layout rendering (wrapping content in an includes template)
//! 4. File writing (output to disk)
//!
//! Plugins insert their own stages after any named stage.
//! Finalize stages run once after all documents are processed.

mod context;
mod document;
mod error;
mod stages;

pub use context::PipelineContext;
pub use document::ProcessingDocument;
pub use error::PipelineError;

use stages::{LayoutStage, MarkdownStage, TemplateEngineStage, WriteStage};

/// A stage in the document processing pipeline.
///
/// Stages transform documents sequentially. Each stage receives all documents
/// and can modify them in place before passing to the next stage.
pub trait Stage: Send + Sync {
    /// Unique name for this stage (used for insertion points).
    fn name(&self) -> &'static str;

    /// Process documents through this stage.
    ///
    /// Documents are passed by mutable reference so stages can transform
    /// their content in place. The `ctx` provides access to shared resources
    /// like the template renderer and the markdown renderer.
    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError>;
}

/// A stage that runs once after all documents are processed.
///
/// Use this for build-wide outputs like feeds and stylesheets.
pub trait FinalizeStage: Send + Sync {
    /// Unique name for this stage.
    fn name(&self) -> &'static str;

    /// Run finalization after all documents are processed and written.
    fn finalize(
        &self,
        docs: &[ProcessingDocument],
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError>;
}

/// The document processing pipeline.
///
/// The default pipeline is: tera → markdown → layout → write.
pub struct Pipeline {
    /// Document processing stages (run for each document batch)
    stages: Vec<Box<dyn Stage>>,
    /// Build-wide stages (run once after all documents)
    finalize_stages: Vec<Box<dyn FinalizeStage>>,
}

impl Pipeline {
    /// Create an empty pipeline with no stages.
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            finalize_stages: Vec::new(),
        }
    }

    /// Create the default pipeline with standard stages.
    pub fn default_pipeline() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(TemplateEngineStage);
        pipeline.add_stage(MarkdownStage);
        pipeline.add_stage(LayoutStage);
        pipeline.add_stage(WriteStage);
        pipeline
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Insert a stage after the named stage.
    pub fn insert_after<S: Stage + 'static>(
        &mut self,
        name: &str,
        stage: S,
    ) -> Result<&mut Self, PipelineError> {
        let pos = self
            .stages
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| PipelineError::UnknownStage(name.to_string()))?;
        self.stages.insert(pos + 1, Box::new(stage));
        Ok(self)
    }

    /// Add a finalize stage (runs after all documents are processed).
    pub fn add_finalize_stage<S: FinalizeStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.finalize_stages.push(Box::new(stage));
        self
    }

    /// Run the pipeline on a set of documents.
    pub fn run(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for stage in &self.stages {
            tracing::debug!(stage = stage.name(), documents = docs.len(), "running stage");
            stage.process(docs, ctx)?;
        }

        for stage in &self.finalize_stages {
            tracing::debug!(stage = stage.name(), "running finalize stage");
            stage.finalize(docs, ctx)?;
        }

        Ok(())
    }

    /// Get the names of all stages in order.
    #[cfg(test)]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Get the names of all finalize stages in order.
    #[cfg(test)]
    pub fn finalize_stage_names(&self) -> Vec<&'static str> {
        self.finalize_stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stage_order() {
        let pipeline = Pipeline::default_pipeline();
        assert_eq!(
            pipeline.stage_names(),
            vec!["tera", "markdown", "layout", "write"]
        );
        assert!(pipeline.finalize_stage_names().is_empty());
    }

    #[test]
    fn test_insert_after_unknown_stage() {
        let mut pipeline = Pipeline::new();
        let result = pipeline.insert_after("markdown", MarkdownStage);
        assert!(matches!(result, Err(PipelineError::UnknownStage(_))));
    }
}
