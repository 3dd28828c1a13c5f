//! Syntax highlighting with autumnus (tree-sitter based).

use std::collections::HashMap;
use std::sync::LazyLock;

use autumnus::{HtmlLinkedBuilder, formatter::Formatter, languages::Language, themes};
use regex::{Captures, Regex};
use tera::Value;

use super::{Plugin, PluginError, PluginHost};
use crate::build::pipeline::{
    FinalizeStage, PipelineContext, PipelineError, ProcessingDocument, Stage,
};
use crate::config::HighlightConfig;
use crate::util::{escape_html, unescape_html};

/// Fenced code blocks as pulldown-cmark writes them.
static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<pre><code class="language-([^"\s]+)">(.*?)</code></pre>"#)
        .expect("Invalid code block regex")
});

// =============================================================================
// Highlighter
// =============================================================================

/// A syntax highlighter producing HTML with CSS classes.
#[derive(Debug, Clone)]
pub struct SyntaxHighlighter {
    /// Theme name for CSS generation
    theme_name: String,
}

impl SyntaxHighlighter {
    /// Create a new syntax highlighter with the given theme.
    pub fn new(theme_name: &str) -> Self {
        Self {
            theme_name: theme_name.to_string(),
        }
    }

    /// Highlight code and return HTML with CSS classes.
    /// Returns the original code wrapped in a plain `<code>` if the language is not supported.
    pub fn highlight(&self, code: &str, language: &str) -> String {
        // Use Language::guess which handles language detection from name or extension
        let lang = Language::guess(language, code);

        if matches!(lang, Language::PlainText)
            && !language.is_empty()
            && language != "plaintext"
            && language != "text"
        {
            return Self::plain_code_block(code, language);
        }

        let formatter = HtmlLinkedBuilder::new().source(code).lang(lang).build();

        match formatter {
            Ok(f) => {
                let mut output: Vec<u8> = Vec::new();
                if f.format(&mut output).is_ok() {
                    String::from_utf8(output)
                        .unwrap_or_else(|_| Self::plain_code_block(code, language))
                } else {
                    Self::plain_code_block(code, language)
                }
            }
            Err(_) => Self::plain_code_block(code, language),
        }
    }

    /// Generate CSS for the current theme, or `None` if the theme is unknown.
    pub fn generate_css(&self) -> Option<String> {
        let theme = themes::get(&self.theme_name).ok()?;
        Some(theme.css(false)) // false = don't enable italic
    }

    /// Highlight every fenced block with a language in rendered HTML.
    pub fn highlight_html(&self, html: &str) -> String {
        CODE_BLOCK
            .replace_all(html, |caps: &Captures| {
                self.highlight(&unescape_html(&caps[2]), &caps[1])
            })
            .into_owned()
    }

    /// Create a plain code block without highlighting.
    fn plain_code_block(code: &str, language: &str) -> String {
        let escaped = escape_html(code);
        if language.is_empty() {
            format!("<pre><code>{}</code></pre>", escaped)
        } else {
            format!(
                "<pre><code class=\"language-{}\">{}</code></pre>",
                language, escaped
            )
        }
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new("dracula")
    }
}

// =============================================================================
// Stages
// =============================================================================

/// Highlights code blocks in markdown output.
struct HighlightStage {
    highlighter: SyntaxHighlighter,
}

impl Stage for HighlightStage {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        _ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs.iter_mut().filter(|d| d.doc.is_markdown()) {
            doc.content = self.highlighter.highlight_html(&doc.content);
        }
        Ok(())
    }
}

/// Writes the theme stylesheet into the output directory.
struct StylesheetStage {
    highlighter: SyntaxHighlighter,
    path: String,
}

impl FinalizeStage for StylesheetStage {
    fn name(&self) -> &'static str {
        "highlight-stylesheet"
    }

    fn finalize(
        &self,
        _docs: &[ProcessingDocument],
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        let css = self.highlighter.generate_css().ok_or_else(|| {
            PipelineError::stage(
                "highlight-stylesheet",
                format!("unknown theme '{}'", self.highlighter.theme_name),
            )
        })?;

        let path = ctx.output_dir.join(self.path.trim_start_matches('/'));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, css)?;
        tracing::debug!(path = %path.display(), "wrote highlight stylesheet");
        Ok(())
    }
}

// =============================================================================
// Plugin
// =============================================================================

/// Highlights fenced code blocks after markdown rendering and provides the
/// `highlight` filter: `{{ snippet | highlight(lang="rust") }}`.
pub struct SyntaxHighlight {
    options: HighlightConfig,
}

impl SyntaxHighlight {
    pub fn new(options: HighlightConfig) -> Self {
        Self { options }
    }
}

impl Plugin for SyntaxHighlight {
    fn name(&self) -> &'static str {
        "syntax-highlight"
    }

    fn install(&self, host: &mut PluginHost) -> Result<(), PluginError> {
        let highlighter = SyntaxHighlighter::new(&self.options.theme);

        if let Some(stylesheet) = &self.options.stylesheet {
            if !stylesheet.ends_with(".css") {
                return Err(PluginError::invalid_options(
                    self.name(),
                    format!("stylesheet must end in .css, got '{stylesheet}'"),
                ));
            }
            if highlighter.generate_css().is_none() {
                return Err(PluginError::invalid_options(
                    self.name(),
                    format!("unknown theme '{}'", self.options.theme),
                ));
            }
            host.add_finalize_stage(StylesheetStage {
                highlighter: highlighter.clone(),
                path: stylesheet.clone(),
            });
        }

        host.add_stage_after(
            "markdown",
            HighlightStage {
                highlighter: highlighter.clone(),
            },
        )?;

        host.add_helper(
            "highlight",
            move |value: &Value, args: &HashMap<String, Value>| {
                let code = tera::try_get_value!("highlight", "value", String, value);
                let lang = args.get("lang").and_then(Value::as_str).unwrap_or_default();
                Ok(Value::String(highlighter.highlight(&code, lang)))
            },
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::pipeline::Pipeline;
    use crate::config::SiteMetadata;
    use crate::site::HelperRegistry;

    fn install(options: HighlightConfig) -> Result<(Pipeline, HelperRegistry), PluginError> {
        let mut host = PluginHost::new(
            Pipeline::default_pipeline(),
            HelperRegistry::default(),
            SiteMetadata::default(),
        );
        SyntaxHighlight::new(options).install(&mut host)?;
        Ok(host.into_parts())
    }

    #[test]
    fn test_highlight_rust() {
        let highlighter = SyntaxHighlighter::default();
        let result = highlighter.highlight("fn main() {}", "rust");
        assert!(result.contains("<pre"));
        assert!(result.contains("</pre>"));
    }

    #[test]
    fn test_highlight_unknown_language() {
        let highlighter = SyntaxHighlighter::default();
        let result = highlighter.highlight("a < b", "unknown_lang_xyz");
        assert_eq!(
            result,
            "<pre><code class=\"language-unknown_lang_xyz\">a &lt; b</code></pre>"
        );
    }

    #[test]
    fn test_highlight_html_replaces_fenced_blocks() {
        let highlighter = SyntaxHighlighter::default();
        let html = "<p>before</p>\n<pre><code class=\"language-nope\">x &amp;&amp; y\n</code></pre>\n<pre><code>plain</code></pre>";
        let out = highlighter.highlight_html(html);
        assert!(out.starts_with("<p>before</p>"));
        // Unknown language round-trips through unescape and escape
        assert!(out.contains("<pre><code class=\"language-nope\">x &amp;&amp; y\n</code></pre>"));
        // Blocks without a language are left alone
        assert!(out.contains("<pre><code>plain</code></pre>"));
    }

    #[test]
    fn test_generate_css() {
        let css = SyntaxHighlighter::new("dracula").generate_css();
        assert!(css.is_some_and(|css| !css.is_empty()));
        assert!(SyntaxHighlighter::new("no-such-theme").generate_css().is_none());
    }

    #[test]
    fn test_install_adds_stage_and_filter() {
        let (pipeline, helpers) = install(HighlightConfig::default()).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["tera", "markdown", "highlight", "layout", "write"]
        );
        assert!(pipeline.finalize_stage_names().is_empty());
        assert!(helpers.contains("highlight"));
    }

    #[test]
    fn test_stylesheet_adds_finalize_stage() {
        let options = HighlightConfig {
            stylesheet: Some("/css/code.css".to_string()),
            ..Default::default()
        };
        let (pipeline, _) = install(options).unwrap();
        assert_eq!(pipeline.finalize_stage_names(), vec!["highlight-stylesheet"]);
    }

    #[test]
    fn test_invalid_stylesheet_options() {
        let not_css = HighlightConfig {
            stylesheet: Some("code.txt".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            install(not_css),
            Err(PluginError::InvalidOptions { plugin: "syntax-highlight", .. })
        ));

        let bad_theme = HighlightConfig {
            theme: "no-such-theme".to_string(),
            stylesheet: Some("code.css".to_string()),
        };
        assert!(install(bad_theme).is_err());
    }

    #[test]
    fn test_highlight_filter() {
        let (_, helpers) = install(HighlightConfig::default()).unwrap();
        let mut tera = tera::Tera::default();
        helpers.register_into(&mut tera);

        let mut context = tera::Context::new();
        context.insert("code", "a < b");
        let out = tera
            .render_str("{{ code | highlight(lang=\"unknown_lang_xyz\") | safe }}", &context)
            .unwrap();
        assert_eq!(out, "<pre><code class=\"language-unknown_lang_xyz\">a &lt; b</code></pre>");
    }
}
