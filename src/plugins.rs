//! Build plugins.
//!
//! A plugin hooks into the build by adding pipeline stages and template
//! helpers through a [`PluginHost`]. Plugins are installed in the order
//! they were registered on the site builder.

mod feed;
mod highlight;
mod toc;

pub use feed::Feed;
pub use highlight::SyntaxHighlight;
pub use toc::TableOfContents;

use crate::build::pipeline::{FinalizeStage, Pipeline, PipelineError, Stage};
use crate::config::SiteMetadata;
use crate::site::HelperRegistry;

#[derive(thiserror::Error, Debug)]
pub enum PluginError {
    #[error("invalid options for plugin '{plugin}': {message}")]
    InvalidOptions {
        plugin: &'static str,
        message: String,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl PluginError {
    pub fn invalid_options(plugin: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            plugin,
            message: message.into(),
        }
    }
}

/// Something that extends the build.
pub trait Plugin: Send + Sync {
    /// Unique name for this plugin (used in logs).
    fn name(&self) -> &'static str;

    /// Validate options and register stages and helpers on the host.
    fn install(&self, host: &mut PluginHost) -> Result<(), PluginError>;
}

/// What a plugin can touch while it is being installed.
pub struct PluginHost {
    pipeline: Pipeline,
    helpers: HelperRegistry,
    site: SiteMetadata,
}

impl PluginHost {
    pub fn new(pipeline: Pipeline, helpers: HelperRegistry, site: SiteMetadata) -> Self {
        Self {
            pipeline,
            helpers,
            site,
        }
    }

    /// Site metadata, e.g. the base URL for absolute links.
    pub fn site(&self) -> &SiteMetadata {
        &self.site
    }

    /// Add a document stage right after the named stage.
    pub fn add_stage_after<S: Stage + 'static>(
        &mut self,
        anchor: &str,
        stage: S,
    ) -> Result<&mut Self, PluginError> {
        self.pipeline.insert_after(anchor, stage)?;
        Ok(self)
    }

    /// Add a stage that runs once after every document is written.
    pub fn add_finalize_stage<S: FinalizeStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.pipeline.add_finalize_stage(stage);
        self
    }

    /// Add a template helper.
    pub fn add_helper<F: tera::Filter + 'static>(&mut self, name: &str, helper: F) -> &mut Self {
        self.helpers.register(name, helper);
        self
    }

    pub fn into_parts(self) -> (Pipeline, HelperRegistry) {
        (self.pipeline, self.helpers)
    }
}
