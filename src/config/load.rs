//! Configuration loading from files and the environment.

use std::path::{Path, PathBuf};

use config::{Environment, File};

use super::{ConfigError, ProjectConfig};

/// Default config file name, looked up relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "quire.yaml";

impl ProjectConfig {
    /// Resolve the config path from the command line argument, defaulting to
    /// `quire.yaml` in the current directory.
    pub fn resolve_path(config_file: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        if config_file.is_relative() {
            Ok(std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file))
        } else {
            Ok(config_file.to_path_buf())
        }
    }

    /// Load the config from a file path.
    ///
    /// The file is optional: a missing file yields the defaults. Values can be
    /// overridden with `QUIRE__`-prefixed environment variables, e.g.
    /// `QUIRE__SITE__URL=https://example.com`.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("QUIRE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ProjectConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::load_from_file(&dir.path().join("quire.yaml")).unwrap();
        assert_eq!(config.output, PathBuf::from("_site"));
        assert_eq!(config.feed.limit, 20);
    }

    #[test]
    fn test_load_yaml_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quire.yaml");
        std::fs::write(
            &path,
            "site:\n  title: Field Notes\n  url: https://notes.example.com\noutput: public\nfeed:\n  limit: 5\n",
        )
        .unwrap();

        let config = ProjectConfig::load_from_file(&path).unwrap();
        assert_eq!(config.site.title, "Field Notes");
        assert_eq!(config.site.url.as_deref(), Some("https://notes.example.com"));
        assert_eq!(config.output, PathBuf::from("public"));
        assert_eq!(config.feed.limit, 5);
        assert_eq!(config.feed.collection, "posts");
    }

    #[test]
    fn test_base_path_from_config() {
        assert_eq!(
            base_path_from_config(Path::new("/project/quire.yaml")),
            PathBuf::from("/project")
        );
        assert_eq!(
            base_path_from_config(Path::new("quire.yaml")),
            PathBuf::from("")
        );
    }
}
