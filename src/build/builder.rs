use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::site::{CopyOutcome, Site, SiteError};

use super::collections::Collections;
use super::data::{DataError, load_global_data};
use super::pipeline::{PipelineContext, PipelineError, ProcessingDocument};
use super::render::{RenderError, Renderer};
use super::source::{ContentSource, SourceError};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Site(#[from] SiteError),

    #[error("failed to copy {source_path}: {error}")]
    Passthrough {
        source_path: PathBuf,
        error: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub output_dir: PathBuf,
    /// Documents rendered (including those with `permalink: false`)
    pub documents: usize,
    /// Files copied by passthrough rules
    pub passthrough_files: usize,
    /// Every page and passthrough file this build wrote
    pub written: BTreeSet<PathBuf>,
}

impl BuildResult {
    /// Delete files an earlier build wrote that this build no longer
    /// produces, e.g. pages whose source was deleted, then any directories
    /// left empty by that. Returns the removed files.
    pub fn remove_stale(&self, previous: &BuildResult) -> std::io::Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for path in previous.written.difference(&self.written) {
            match std::fs::remove_file(path) {
                Ok(()) => removed.push(path.clone()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            }

            let mut dir = path.parent();
            while let Some(current) = dir
                && current != self.output_dir
                && current.starts_with(&self.output_dir)
            {
                // Stops at the first directory that still has files
                if std::fs::remove_dir(current).is_err() {
                    break;
                }
                dir = current.parent();
            }
        }
        Ok(removed)
    }
}

/// Drives a build of an assembled [`Site`].
pub struct Builder {
    site: Site,
    /// Base path for resolving relative paths (typically the config file's directory)
    base_path: PathBuf,
    dev_mode: bool,
    live_reload: bool,
}

impl Builder {
    pub fn new(site: Site, base_path: PathBuf) -> Self {
        Self {
            site,
            base_path,
            dev_mode: false,
            live_reload: false,
        }
    }

    /// Enable development mode (exposed to templates as `quire.dev`).
    pub fn with_dev_mode(mut self, dev: bool) -> Self {
        self.dev_mode = dev;
        self
    }

    /// Inject the live reload script into written pages (dev mode only).
    pub fn with_live_reload(mut self, enabled: bool) -> Self {
        self.live_reload = enabled;
        self
    }

    pub fn build(&self) -> Result<BuildResult, BuildError> {
        // Build steps:
        // 1. Load global data
        // 2. Discover documents
        // 3. Build collections
        // 4. Run the pipeline (stages, then finalize stages)
        // 5. Apply passthrough rules

        let config = &self.site.config;
        let output_dir = config.dir.output_path(&self.base_path)?;
        let source = ContentSource::resolve(config, &self.base_path)?;

        // Step 1: Global data
        let data = load_global_data(&source.input_dir.join(&config.dir.data))?;

        // Step 2: Documents
        let documents = source.discover(config)?;
        info!(
            documents = documents.len(),
            input = %source.input_dir.display(),
            plugins = ?self.site.plugins,
            "discovered content"
        );

        // Step 3: Collections
        let collections = Collections::from_documents(&documents);

        // Step 4: Pipeline
        std::fs::create_dir_all(&output_dir)?;

        let mut renderer =
            Renderer::new(&source.input_dir.join(&config.dir.includes), &self.site.helpers)?;
        let mut docs: Vec<ProcessingDocument> =
            documents.into_iter().map(ProcessingDocument::new).collect();

        let mut ctx = PipelineContext::new(
            &output_dir,
            config,
            self.site.metadata(),
            &data,
            &collections,
            self.site.markdown.as_ref(),
            &mut renderer,
            self.dev_mode,
            self.live_reload,
        );
        self.site.pipeline.run(&mut docs, &mut ctx)?;

        // Step 5: Passthrough copies
        let copied = self.copy_passthrough(&output_dir)?;
        let passthrough_files = copied.len();
        let mut written: BTreeSet<PathBuf> =
            docs.iter().filter_map(|doc| doc.output_path.clone()).collect();
        written.extend(copied);

        let display_output = output_dir.canonicalize().unwrap_or(output_dir.clone());
        info!(
            documents = docs.len(),
            passthrough_files,
            output = %display_output.display(),
            "build complete"
        );

        Ok(BuildResult {
            output_dir,
            documents: docs.len(),
            passthrough_files,
            written,
        })
    }

    /// Copy every passthrough rule into the output directory.
    ///
    /// Missing sources are skipped with a warning.
    fn copy_passthrough(&self, output_dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
        let mut copied = Vec::new();
        for rule in &self.site.passthrough {
            let outcome = rule
                .copy(&self.base_path, output_dir)
                .map_err(|error| BuildError::Passthrough {
                    source_path: rule.source.clone(),
                    error,
                })?;
            match outcome {
                CopyOutcome::Copied(files) => {
                    tracing::debug!(
                        source = %rule.source.display(),
                        destination = %rule.destination.display(),
                        files = files.len(),
                        "copied passthrough"
                    );
                    copied.extend(files);
                }
                CopyOutcome::Missing => {
                    warn!(source = %rule.source.display(), "passthrough source not found, skipping");
                }
            }
        }
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProjectConfig, SiteMetadata};
    use crate::site::load_site;

    fn write(root: &Path, path: &str, content: &str) {
        let path = root.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn read(root: &Path, path: &str) -> String {
        std::fs::read_to_string(root.join(path)).unwrap()
    }

    fn project() -> ProjectConfig {
        ProjectConfig {
            site: SiteMetadata {
                title: "Field Notes".to_string(),
                url: Some("https://notes.example.com".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "src/_includes/post.html",
            "<html><body><h1>{{ page.title }}</h1><time>{{ page.date | formatted_date }}</time>{{ content | safe }}</body></html>",
        );
        write(
            root,
            "src/_data/author.yaml",
            "name: Jane\n",
        );
        write(
            root,
            "src/posts/hello.md",
            "---\ntitle: Hello\ndate: 2024-01-05\ntags: posts\nlayout: post\n---\nBy {{ data.author.name }}\n\n## Setup\n\n```rust:main.rs\nfn main() {}\n```\n",
        );
        write(
            root,
            "src/index.tera",
            "<ul>{% for post in collections.posts %}<li><a href=\"{{ post.url }}\">{{ post.title }}</a></li>{% endfor %}</ul>",
        );
        write(root, "src/drafts.md", "---\npermalink: false\n---\nnot yet");
        write(root, "src/style/prism.css", "pre { color: red; }");
        write(root, "src/assets/images/logo.svg", "<svg/>");
        dir
    }

    #[test]
    fn test_build_site() {
        let dir = fixture();
        let root = dir.path();

        let site = load_site(project()).unwrap();
        let result = Builder::new(site, root.to_path_buf()).build().unwrap();

        assert_eq!(result.output_dir, root.join("_site"));
        assert_eq!(result.documents, 3);
        assert_eq!(result.passthrough_files, 2);

        let post = read(root, "_site/posts/hello/index.html");
        assert!(post.contains("<h1>Hello</h1>"));
        assert!(post.contains("<time>Jan 5, 2024</time>"));
        assert!(post.contains("By Jane"));
        assert!(post.contains(r#"<h2 id="setup">Setup</h2>"#));
        assert!(post.contains(r#"<div class="named-fence-filename">main.rs</div>"#));
        assert!(!post.contains("EventSource"));

        let index = read(root, "_site/index.html");
        assert_eq!(index, r#"<ul><li><a href="/posts/hello/">Hello</a></li></ul>"#);

        assert!(!root.join("_site/drafts/index.html").exists());
        assert_eq!(read(root, "_site/prism.css"), "pre { color: red; }");
        assert_eq!(read(root, "_site/images/logo.svg"), "<svg/>");
        assert!(read(root, "_site/feed.xml").contains("<title>Hello</title>"));
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let dir = fixture();
        let root = dir.path();

        let builder = Builder::new(load_site(project()).unwrap(), root.to_path_buf());
        builder.build().unwrap();
        let first = read(root, "_site/posts/hello/index.html");
        builder.build().unwrap();
        assert_eq!(read(root, "_site/posts/hello/index.html"), first);
    }

    #[test]
    fn test_live_reload_injected_in_dev_mode() {
        let dir = fixture();
        let root = dir.path();

        let builder = Builder::new(load_site(project()).unwrap(), root.to_path_buf())
            .with_dev_mode(true)
            .with_live_reload(true);
        builder.build().unwrap();

        assert!(read(root, "_site/posts/hello/index.html").contains("/_quire/live-reload"));
    }

    #[test]
    fn test_rebuild_removes_output_of_deleted_sources() {
        let dir = fixture();
        let root = dir.path();
        write(root, "src/notes/old.md", "retired");
        write(root, "src/assets/images/old.svg", "<svg/>");

        let builder = Builder::new(load_site(project()).unwrap(), root.to_path_buf());
        let first = builder.build().unwrap();
        assert!(root.join("_site/notes/old/index.html").exists());
        assert!(first.written.contains(&root.join("_site/images/old.svg")));

        std::fs::remove_file(root.join("src/notes/old.md")).unwrap();
        std::fs::remove_file(root.join("src/assets/images/old.svg")).unwrap();
        let second = builder.build().unwrap();
        let removed = second.remove_stale(&first).unwrap();

        assert_eq!(
            removed,
            vec![
                root.join("_site/images/old.svg"),
                root.join("_site/notes/old/index.html"),
            ]
        );
        assert!(!root.join("_site/notes").exists());
        assert!(root.join("_site/images/logo.svg").exists());
        assert!(root.join("_site/posts/hello/index.html").exists());
        assert!(second.remove_stale(&second).unwrap().is_empty());
    }

    #[test]
    fn test_output_containing_input_rejected() {
        let dir = fixture();
        let root = dir.path();

        let mut site = load_site(project()).unwrap();
        site.config.dir.output = ".".into();
        let builder = Builder::new(site, root.to_path_buf());

        assert!(matches!(builder.build(), Err(BuildError::Site(SiteError::InvalidConfig(_)))));
        assert!(!root.join("index.html").exists());
    }

    #[test]
    fn test_missing_input_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let builder = Builder::new(load_site(project()).unwrap(), dir.path().to_path_buf());
        assert!(matches!(builder.build(), Err(BuildError::Source(_))));
    }
}
