pub mod build;
pub mod clean;
pub mod serve;

use std::path::{Path, PathBuf};

use crate::config::{ProjectConfig, base_path_from_config};

/// Load the project config named on the command line (or `quire.yaml`).
///
/// Returns the config, its resolved path and the project root.
pub fn load_project(config_file: Option<&Path>) -> anyhow::Result<(ProjectConfig, PathBuf, PathBuf)> {
    let config_path = ProjectConfig::resolve_path(config_file)?;
    let config = ProjectConfig::load_from_file(&config_path)?;
    let base_path = base_path_from_config(&config_path);
    Ok((config, config_path, base_path))
}
