//! The build configuration of this site.

use super::{BuildConfig, DirConfig, Site, SiteBuilder, SiteError, TemplateEngine, date};
use crate::config::ProjectConfig;
use crate::markdown::{AnchorOptions, CmarkRenderer, MarkdownRendererExt};
use crate::plugins::{Feed, SyntaxHighlight, TableOfContents};

/// Files and directories copied into the output as they are.
const PASSTHROUGH: &[(&str, &str)] = &[
    ("src/assets/fonts", "fonts"),
    ("src/assets/images", "images"),
    ("src/assets/fontawesome", "fontawesome"),
    ("src/assets/inline-images", "inline-images"),
    ("src/style/prism.css", "prism.css"),
    ("src/extra/robots.txt", "robots.txt"),
];

/// Extensions rendered as content.
const TEMPLATE_FORMATS: &[&str] = &["md", "tera", "html"];

/// Register everything the site needs on `site` and return its build
/// configuration.
///
/// Fails only when the markdown options name an unknown extension.
pub fn assemble(site: &mut SiteBuilder) -> Result<BuildConfig, SiteError> {
    for (source, destination) in PASSTHROUGH {
        site.with_passthrough(*source, *destination);
    }

    site.with_helper("formatted_date", date::formatted_date);

    let project = site.project().clone();
    let markdown = CmarkRenderer::new(&project.markdown)?
        .with_anchors(AnchorOptions::default())
        .with_named_code_blocks();

    site.with_plugin(SyntaxHighlight::new(project.highlight.clone()))
        .with_plugin(Feed::new(project.feed.clone()))
        .with_plugin(TableOfContents::new([2, 3]))
        .with_markdown(markdown);

    Ok(BuildConfig {
        dir: DirConfig {
            input: "src".into(),
            data: "_data".into(),
            includes: "_includes".into(),
            output: project.output.clone(),
        },
        markdown_template_engine: TemplateEngine::Tera,
        html_template_engine: TemplateEngine::Tera,
        template_formats: TEMPLATE_FORMATS.iter().map(|f| f.to_string()).collect(),
    })
}

/// Assemble the site for a project.
pub fn load_site(project: ProjectConfig) -> Result<Site, SiteError> {
    let mut builder = SiteBuilder::new(project);
    let config = assemble(&mut builder)?;
    builder.finish(config)
}
