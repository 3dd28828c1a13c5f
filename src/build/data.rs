//! Global data files.
//!
//! Every `*.json`, `*.yaml` and `*.yml` file directly inside the data
//! directory is loaded and exposed to templates as `data.<file stem>`.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

#[derive(thiserror::Error, Debug)]
pub enum DataError {
    #[error("failed to read data file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Load the global data directory into a JSON object.
///
/// A missing directory yields an empty object.
pub fn load_global_data(data_dir: &Path) -> Result<Value, DataError> {
    let mut data = Map::new();
    if !data_dir.is_dir() {
        return Ok(Value::Object(data));
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(data_dir)
        .map_err(|e| DataError::Read {
            path: data_dir.to_path_buf(),
            source: e,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    for path in entries {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if !matches!(extension, "json" | "yaml" | "yml") {
            continue;
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| DataError::Read {
            path: path.clone(),
            source: e,
        })?;
        let value: Value = if extension == "json" {
            serde_json::from_str(&raw).map_err(|e| DataError::Json {
                path: path.clone(),
                source: e,
            })?
        } else {
            serde_yaml::from_str(&raw).map_err(|e| DataError::Yaml {
                path: path.clone(),
                source: e,
            })?
        };

        tracing::debug!(path = %path.display(), key = stem, "loaded global data");
        data.insert(stem.to_string(), value);
    }

    Ok(Value::Object(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_dir_is_empty() {
        let data = load_global_data(Path::new("/does/not/exist")).unwrap();
        assert_eq!(data, json!({}));
    }

    #[test]
    fn test_json_and_yaml_keyed_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("links.json"), r#"[{"name": "GitHub"}]"#).unwrap();
        std::fs::write(dir.path().join("author.yaml"), "name: Jane\nsocial: jane.dev\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let data = load_global_data(dir.path()).unwrap();
        assert_eq!(
            data,
            json!({
                "links": [{"name": "GitHub"}],
                "author": {"name": "Jane", "social": "jane.dev"},
            })
        );
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let err = load_global_data(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::Json { .. }));
    }
}
