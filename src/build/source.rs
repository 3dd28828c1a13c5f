//! Content discovery in the input directory.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::document::{Document, parse_front_matter};
use super::paths::document_url;
use crate::site::BuildConfig;

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("input directory does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("input path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

// =============================================================================
// Discovery
// =============================================================================

/// Directories never treated as content, wherever they appear.
const IGNORED_DIRS: &[&str] = &["node_modules"];

/// Where content lives and what to skip while walking it.
#[derive(Debug, Clone)]
pub struct ContentSource {
    /// The resolved input directory
    pub input_dir: PathBuf,
    /// Directories under the input that hold templates and data, not pages
    excluded: Vec<PathBuf>,
}

impl ContentSource {
    /// Resolve the input directory of `config` against the project root.
    ///
    /// The includes, data and output directories are excluded from discovery.
    pub fn resolve(config: &BuildConfig, base_path: &Path) -> Result<Self, SourceError> {
        let input_dir = base_path.join(&config.dir.input);
        if !input_dir.exists() {
            return Err(SourceError::PathNotFound(input_dir));
        }
        if !input_dir.is_dir() {
            return Err(SourceError::NotADirectory(input_dir));
        }

        let excluded = vec![
            input_dir.join(&config.dir.includes),
            input_dir.join(&config.dir.data),
            base_path.join(&config.dir.output),
        ];

        Ok(Self {
            input_dir,
            excluded,
        })
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        // The input directory itself may be hidden-looking (e.g. ".")
        if entry.depth() == 0 {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.')
            || (entry.file_type().is_dir() && IGNORED_DIRS.contains(&name.as_ref()))
            || self.excluded.iter().any(|dir| entry.path() == dir)
    }

    /// Discover every content document whose extension is a template format.
    ///
    /// Documents come back sorted by source path, with front matter parsed
    /// and output URLs computed.
    pub fn discover(&self, config: &BuildConfig) -> Result<Vec<Document>, SourceError> {
        let mut documents = Vec::new();

        let walker = WalkDir::new(&self.input_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e));

        for entry in walker {
            let entry = entry.map_err(|e| SourceError::Walk {
                path: self.input_dir.clone(),
                source: e,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(format) = entry.path().extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !config.is_template_format(format) {
                continue;
            }

            let raw = std::fs::read_to_string(entry.path()).map_err(|e| SourceError::Read {
                path: entry.path().to_path_buf(),
                source: e,
            })?;
            let parsed = parse_front_matter(&raw);

            let source_path = entry
                .path()
                .strip_prefix(&self.input_dir)
                .unwrap_or(entry.path())
                .to_path_buf();

            let mut doc = Document {
                source_path,
                format: format.to_string(),
                url: None,
                front_matter: parsed.front_matter,
                body: parsed.content,
            };
            doc.url = document_url(&doc);

            tracing::debug!(
                path = %doc.source_path.display(),
                url = doc.url.as_deref().unwrap_or("-"),
                "discovered document"
            );
            documents.push(doc);
        }

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{DirConfig, TemplateEngine};

    fn config() -> BuildConfig {
        BuildConfig {
            dir: DirConfig {
                input: "src".into(),
                data: "_data".into(),
                includes: "_includes".into(),
                output: "_site".into(),
            },
            markdown_template_engine: TemplateEngine::Tera,
            html_template_engine: TemplateEngine::Tera,
            template_formats: vec!["md".into(), "tera".into(), "html".into()],
        }
    }

    fn write(root: &Path, path: &str, content: &str) {
        let path = root.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_missing_input_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentSource::resolve(&config(), dir.path()).unwrap_err();
        assert!(matches!(err, SourceError::PathNotFound(_)));
    }

    #[test]
    fn test_discover_skips_non_content() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/index.md", "# Home");
        write(root, "src/posts/first.md", "---\ntitle: First\n---\nHello");
        write(root, "src/feed.tera", "feed");
        write(root, "src/_includes/base.html", "{{ content }}");
        write(root, "src/_data/site.json", "{}");
        write(root, "src/.drafts/secret.md", "secret");
        write(root, "src/node_modules/pkg/readme.md", "dependency");
        write(root, "src/style/prism.css", "pre {}");

        let config = config();
        let source = ContentSource::resolve(&config, root).unwrap();
        let docs = source.discover(&config).unwrap();

        let paths: Vec<_> = docs
            .iter()
            .map(|d| d.source_path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(paths, vec!["feed.tera", "index.md", "posts/first.md"]);

        let first = &docs[2];
        assert_eq!(first.title(), "First");
        assert_eq!(first.body, "Hello");
        assert_eq!(first.url.as_deref(), Some("/posts/first/"));
    }

    #[test]
    fn test_output_dir_inside_input_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "about.md", "About");
        write(root, "_site/about/index.html", "<p>About</p>");

        let mut config = config();
        config.dir.input = ".".into();
        let source = ContentSource::resolve(&config, root).unwrap();
        let docs = source.discover(&config).unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source_path, PathBuf::from("about.md"));
    }
}
