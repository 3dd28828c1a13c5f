//! Configuration loading and types for quire.
//!
//! This module handles all aspects of project configuration:
//! - Type definitions for config structures (`types`)
//! - Layered loading from `quire.yaml` and the environment (`load`)

mod load;
mod types;

use std::path::Component;

use crate::util::normalize_path;

pub use load::base_path_from_config;
pub use types::{
    FeedConfig, HighlightConfig, MarkdownConfig, ProjectConfig, SiteMetadata, WatchConfig,
};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("{0}")]
    Validation(String),
}

impl ProjectConfig {
    /// Check the values serde can't express constraints for.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.site.url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(format!(
                "invalid config: 'site.url' must be an absolute http(s) URL, got '{url}'"
            )));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "invalid config: 'output' cannot be empty".to_string(),
            ));
        }
        if self.output.is_relative()
            && normalize_path(&self.output)
                .components()
                .all(|c| c == Component::ParentDir)
        {
            return Err(ConfigError::Validation(format!(
                "invalid config: 'output' cannot be the project root or above it, got '{}'",
                self.output.display()
            )));
        }
        Ok(())
    }
}
