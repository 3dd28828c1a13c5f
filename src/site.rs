//! Site assembly.
//!
//! A [`SiteBuilder`] is the registrar handed to [`assemble`]: passthrough
//! rules, template helpers, plugins and the markdown renderer are registered
//! on it, and [`SiteBuilder::finish`] turns the registrations plus the
//! returned [`BuildConfig`] into an immutable [`Site`] for the build driver.

mod assemble;
pub mod date;
mod helpers;
mod passthrough;

pub use assemble::{assemble, load_site};
pub use helpers::HelperRegistry;
pub use passthrough::{CopyOutcome, PassthroughRule};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::build::pipeline::Pipeline;
use crate::config::{ProjectConfig, SiteMetadata};
use crate::markdown::{CmarkRenderer, MarkdownError, MarkdownRenderer};
use crate::plugins::{Plugin, PluginError, PluginHost};
use crate::util::normalize_path;

#[derive(thiserror::Error, Debug)]
pub enum SiteError {
    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("markdown error: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("invalid build config: {0}")]
    InvalidConfig(String),
}

// =============================================================================
// Build configuration
// =============================================================================

/// Directory conventions. `data` and `includes` are relative to `input`;
/// `input` and `output` are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirConfig {
    pub input: PathBuf,
    pub data: PathBuf,
    pub includes: PathBuf,
    pub output: PathBuf,
}

impl DirConfig {
    /// The output directory resolved against the project root.
    ///
    /// The output is cleaned and overwritten, so it may not be the input
    /// directory or any directory containing it (the project root included).
    pub fn output_path(&self, base_path: &Path) -> Result<PathBuf, SiteError> {
        let input = normalize_path(&base_path.join(&self.input));
        let output = normalize_path(&base_path.join(&self.output));

        let overlaps = input.starts_with(&output)
            || matches!(
                (input.canonicalize(), output.canonicalize()),
                (Ok(input), Ok(output)) if input.starts_with(&output)
            );
        if overlaps {
            return Err(SiteError::InvalidConfig(format!(
                "output directory {} contains the input directory {}",
                output.display(),
                input.display()
            )));
        }
        Ok(output)
    }
}

/// Which engine preprocesses a content file before it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateEngine {
    Tera,
    /// Content is used as written
    Disabled,
}

/// The configuration returned by [`assemble`] and consumed by the builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfig {
    pub dir: DirConfig,
    pub markdown_template_engine: TemplateEngine,
    pub html_template_engine: TemplateEngine,
    /// File extensions rendered as content, without the dot
    pub template_formats: Vec<String>,
}

impl BuildConfig {
    /// Whether files with this extension are rendered as content.
    pub fn is_template_format(&self, extension: &str) -> bool {
        self.template_formats.iter().any(|f| f == extension)
    }

    /// The engine that preprocesses files of the given format.
    ///
    /// Tera files always go through Tera; that is what makes them Tera files.
    pub fn engine_for(&self, format: &str) -> TemplateEngine {
        match format {
            "md" => self.markdown_template_engine,
            "html" => self.html_template_engine,
            _ => TemplateEngine::Tera,
        }
    }

    fn validate(&self) -> Result<(), SiteError> {
        if self.template_formats.is_empty() {
            return Err(SiteError::InvalidConfig(
                "at least one template format is required".to_string(),
            ));
        }
        if let Some(format) = self
            .template_formats
            .iter()
            .find(|f| f.is_empty() || f.starts_with('.'))
        {
            return Err(SiteError::InvalidConfig(format!(
                "template formats are bare extensions, got '{format}'"
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Assembled site
// =============================================================================

/// Everything the build driver needs, fixed once assembled.
pub struct Site {
    pub config: BuildConfig,
    pub project: ProjectConfig,
    pub passthrough: Vec<PassthroughRule>,
    pub helpers: HelperRegistry,
    pub markdown: Box<dyn MarkdownRenderer>,
    pub pipeline: Pipeline,
    /// Names of the installed plugins, in installation order
    pub plugins: Vec<&'static str>,
}

impl Site {
    pub fn metadata(&self) -> &SiteMetadata {
        &self.project.site
    }
}

/// The registrar: collects registrations until [`finish`](Self::finish).
pub struct SiteBuilder {
    project: ProjectConfig,
    passthrough: Vec<PassthroughRule>,
    helpers: HelperRegistry,
    plugins: Vec<Box<dyn Plugin>>,
    markdown: Option<Box<dyn MarkdownRenderer>>,
}

impl SiteBuilder {
    pub fn new(project: ProjectConfig) -> Self {
        Self {
            project,
            passthrough: Vec::new(),
            helpers: HelperRegistry::default(),
            plugins: Vec::new(),
            markdown: None,
        }
    }

    /// Project settings the registrations may depend on.
    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    /// Copy `source` (relative to the project root) to `destination`
    /// (relative to the output directory) without transformation.
    ///
    /// Registering the same rule twice keeps a single copy of it.
    pub fn with_passthrough(
        &mut self,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> &mut Self {
        let rule = PassthroughRule::new(source, destination);
        if !self.passthrough.contains(&rule) {
            self.passthrough.push(rule);
        }
        self
    }

    /// Register a template helper, available to templates as a filter.
    pub fn with_helper<F: tera::Filter + 'static>(&mut self, name: &str, helper: F) -> &mut Self {
        self.helpers.register(name, helper);
        self
    }

    /// Register a plugin. Plugins are installed in registration order.
    pub fn with_plugin<P: Plugin + 'static>(&mut self, plugin: P) -> &mut Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Set the markdown renderer, replacing any previous one.
    pub fn with_markdown<R: MarkdownRenderer + 'static>(&mut self, renderer: R) -> &mut Self {
        self.markdown = Some(Box::new(renderer));
        self
    }

    /// Install plugins and freeze the registrations into a [`Site`].
    pub fn finish(self, config: BuildConfig) -> Result<Site, SiteError> {
        config.validate()?;

        let mut host = PluginHost::new(
            Pipeline::default_pipeline(),
            self.helpers,
            self.project.site.clone(),
        );
        let mut plugins = Vec::with_capacity(self.plugins.len());
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "installing plugin");
            plugin.install(&mut host)?;
            plugins.push(plugin.name());
        }
        let (pipeline, helpers) = host.into_parts();

        let markdown = match self.markdown {
            Some(markdown) => markdown,
            None => Box::new(CmarkRenderer::new(&self.project.markdown)?),
        };

        Ok(Site {
            config,
            project: self.project,
            passthrough: self.passthrough,
            helpers,
            markdown,
            pipeline,
            plugins,
        })
    }
}
