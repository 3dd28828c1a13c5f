//! Atom feed generation.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Utc};
use regex::{Captures, Regex};
use tera::Value;

use super::{Plugin, PluginError, PluginHost};
use crate::build::collections::ALL;
use crate::build::pipeline::{FinalizeStage, PipelineContext, PipelineError, ProcessingDocument};
use crate::config::{FeedConfig, SiteMetadata};
use crate::site::date::{DateLike, parse_date};
use crate::util::escape_html;

/// Root-relative `href` and `src` attributes.
static ROOT_RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(href|src)="(/[^/"][^"]*|/)""#).expect("Invalid root-relative url regex")
});

// =============================================================================
// URL helpers
// =============================================================================

/// Resolve a root-relative URL against the site's base URL.
///
/// Absolute and protocol-relative URLs are returned unchanged, as is
/// everything when there is no base URL.
pub fn absolute_url(url: &str, base: Option<&str>) -> String {
    let is_absolute =
        url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//");
    match base {
        Some(base) if !is_absolute => {
            format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
        }
        _ => url.to_string(),
    }
}

/// Rewrite root-relative `href`/`src` attributes in HTML to absolute URLs.
pub fn html_to_absolute_urls(html: &str, base: Option<&str>) -> String {
    if base.is_none() {
        return html.to_string();
    }
    ROOT_RELATIVE
        .replace_all(html, |caps: &Captures| {
            format!("{}=\"{}\"", &caps[1], absolute_url(&caps[2], base))
        })
        .into_owned()
}

// =============================================================================
// Date helpers
// =============================================================================

/// Parse a template value as a date, failing the render when it isn't one.
fn date_value(filter: &str, value: &Value) -> tera::Result<DateTime<FixedOffset>> {
    DateLike::from_value(value)
        .and_then(DateLike::parse)
        .ok_or_else(|| tera::Error::msg(format!("{filter}: not a date: {value}")))
}

/// The latest `date` among collection items; undated items are ignored.
pub fn newest_item_date(items: &[Value]) -> Option<DateTime<FixedOffset>> {
    items
        .iter()
        .filter_map(|item| item.get("date"))
        .filter_map(|date| DateLike::from_value(date).and_then(DateLike::parse))
        .max()
}

// =============================================================================
// Feed model
// =============================================================================

/// One feed entry.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    /// Absolute URL of the page
    pub url: String,
    pub updated: DateTime<FixedOffset>,
    pub summary: Option<String>,
    /// Page body HTML with absolute URLs
    pub content: String,
}

/// Select the entries for a feed: documents in `collection` that are
/// written and dated, newest first, at most `limit`.
pub fn collect_entries(
    docs: &[ProcessingDocument],
    options: &FeedConfig,
    base: Option<&str>,
) -> Vec<FeedEntry> {
    let mut entries: Vec<FeedEntry> = docs
        .iter()
        .filter(|doc| {
            options.collection == ALL || doc.doc.front_matter.tags.contains(&options.collection)
        })
        .filter_map(|doc| {
            let url = doc.url()?;
            let updated = doc.doc.front_matter.date.as_deref().and_then(parse_date)?;
            Some(FeedEntry {
                title: doc.title(),
                url: absolute_url(url, base),
                updated,
                summary: doc.doc.front_matter.description.clone(),
                content: html_to_absolute_urls(&doc.content, base),
            })
        })
        .collect();

    entries.sort_by(|a, b| b.updated.cmp(&a.updated));
    entries.truncate(options.limit);
    entries
}

/// Render an Atom feed document.
pub fn render_feed(
    site: &SiteMetadata,
    options: &FeedConfig,
    base: &str,
    entries: &[FeedEntry],
) -> String {
    let base = base.trim_end_matches('/');
    let site_url = format!("{}/", base);
    let feed_url = absolute_url(&options.path, Some(base));
    let updated = entries
        .iter()
        .map(|e| e.updated)
        .max()
        .unwrap_or_else(|| Utc::now().fixed_offset());
    let title = options.title.as_deref().unwrap_or(&site.title);

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str(&format!(
        "<feed xmlns=\"http://www.w3.org/2005/Atom\" xml:lang=\"{}\">\n",
        escape_html(&site.language)
    ));
    xml.push_str(&format!("  <title>{}</title>\n", escape_html(title)));
    if let Some(subtitle) = options.subtitle.as_deref().or(site.description.as_deref()) {
        xml.push_str(&format!("  <subtitle>{}</subtitle>\n", escape_html(subtitle)));
    }
    xml.push_str(&format!(
        "  <link href=\"{}\" rel=\"self\"/>\n",
        escape_html(&feed_url)
    ));
    xml.push_str(&format!("  <link href=\"{}\"/>\n", escape_html(&site_url)));
    xml.push_str(&format!("  <updated>{}</updated>\n", updated.to_rfc3339()));
    xml.push_str(&format!("  <id>{}</id>\n", escape_html(&site_url)));
    if let Some(author) = &site.author {
        xml.push_str(&format!(
            "  <author>\n    <name>{}</name>\n  </author>\n",
            escape_html(author)
        ));
    }

    for entry in entries {
        xml.push_str("  <entry>\n");
        xml.push_str(&format!("    <title>{}</title>\n", escape_html(&entry.title)));
        xml.push_str(&format!("    <link href=\"{}\"/>\n", escape_html(&entry.url)));
        xml.push_str(&format!(
            "    <updated>{}</updated>\n",
            entry.updated.to_rfc3339()
        ));
        xml.push_str(&format!("    <id>{}</id>\n", escape_html(&entry.url)));
        if let Some(summary) = &entry.summary {
            xml.push_str(&format!("    <summary>{}</summary>\n", escape_html(summary)));
        }
        xml.push_str(&format!(
            "    <content type=\"html\">{}</content>\n",
            escape_html(&entry.content)
        ));
        xml.push_str("  </entry>\n");
    }

    xml.push_str("</feed>\n");
    xml
}

// =============================================================================
// Stage
// =============================================================================

/// Writes the feed once every document has been rendered.
struct FeedStage {
    options: FeedConfig,
}

impl FinalizeStage for FeedStage {
    fn name(&self) -> &'static str {
        "feed"
    }

    fn finalize(
        &self,
        docs: &[ProcessingDocument],
        ctx: &PipelineContext,
    ) -> Result<(), PipelineError> {
        let Some(base) = ctx.site.url.as_deref() else {
            tracing::warn!("site.url is not set, skipping feed");
            return Ok(());
        };

        let entries = collect_entries(docs, &self.options, Some(base));
        let xml = render_feed(ctx.site, &self.options, base, &entries);

        let path = ctx.output_dir.join(self.options.path.trim_start_matches('/'));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, xml)?;
        tracing::debug!(path = %path.display(), entries = entries.len(), "wrote feed");
        Ok(())
    }
}

// =============================================================================
// Plugin
// =============================================================================

/// Writes an Atom feed and provides the feed template filters:
/// `date_to_rfc3339`, `date_to_rfc822`, `newest_collection_item_date`,
/// `absolute_url` and `html_to_absolute_urls`.
pub struct Feed {
    options: FeedConfig,
}

impl Feed {
    pub fn new(options: FeedConfig) -> Self {
        Self { options }
    }

    fn validate(&self) -> Result<(), PluginError> {
        if !self.options.path.ends_with(".xml") {
            return Err(PluginError::invalid_options(
                self.name(),
                format!("feed path must end in .xml, got '{}'", self.options.path),
            ));
        }
        if self.options.limit == 0 {
            return Err(PluginError::invalid_options(
                self.name(),
                "limit must be greater than zero",
            ));
        }
        if self.options.collection.trim().is_empty() {
            return Err(PluginError::invalid_options(
                self.name(),
                "collection cannot be empty",
            ));
        }
        Ok(())
    }
}

impl Plugin for Feed {
    fn name(&self) -> &'static str {
        "feed"
    }

    fn install(&self, host: &mut PluginHost) -> Result<(), PluginError> {
        self.validate()?;

        let base = host.site().url.clone();

        host.add_finalize_stage(FeedStage {
            options: self.options.clone(),
        });

        host.add_helper(
            "date_to_rfc3339",
            |value: &Value, _args: &HashMap<String, Value>| {
                let date = date_value("date_to_rfc3339", value)?;
                Ok(Value::String(date.to_rfc3339()))
            },
        );

        host.add_helper(
            "date_to_rfc822",
            |value: &Value, _args: &HashMap<String, Value>| {
                let date = date_value("date_to_rfc822", value)?;
                Ok(Value::String(date.to_rfc2822()))
            },
        );

        // Empty or undated collections fall back to the `fallback` argument
        host.add_helper(
            "newest_collection_item_date",
            |value: &Value, args: &HashMap<String, Value>| {
                let items = tera::try_get_value!(
                    "newest_collection_item_date",
                    "value",
                    Vec<Value>,
                    value
                );
                let newest = match (newest_item_date(&items), args.get("fallback")) {
                    (Some(date), _) => date,
                    (None, Some(fallback)) => date_value("newest_collection_item_date", fallback)?,
                    (None, None) => {
                        return Err(tera::Error::msg(
                            "newest_collection_item_date: collection has no dated items",
                        ));
                    }
                };
                Ok(Value::String(newest.to_rfc3339()))
            },
        );

        let url_base = base.clone();
        host.add_helper(
            "absolute_url",
            move |value: &Value, args: &HashMap<String, Value>| {
                let url = tera::try_get_value!("absolute_url", "value", String, value);
                let base = args.get("base").and_then(Value::as_str).or(url_base.as_deref());
                Ok(Value::String(absolute_url(&url, base)))
            },
        );

        host.add_helper(
            "html_to_absolute_urls",
            move |value: &Value, args: &HashMap<String, Value>| {
                let html = tera::try_get_value!("html_to_absolute_urls", "value", String, value);
                let base = args.get("base").and_then(Value::as_str).or(base.as_deref());
                Ok(Value::String(html_to_absolute_urls(&html, base)))
            },
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::pipeline::Pipeline;
    use crate::build::document::{Document, FrontMatter};
    use crate::site::HelperRegistry;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const BASE: &str = "https://notes.example.com";

    fn doc(path: &str, date: Option<&str>, tags: &[&str], content: &str) -> ProcessingDocument {
        let mut doc = ProcessingDocument::new(Document {
            source_path: format!("{path}.md").into(),
            format: "md".to_string(),
            url: Some(format!("/{path}/")),
            front_matter: FrontMatter {
                title: Some(path.to_string()),
                date: date.map(str::to_string),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
            body: String::new(),
        });
        doc.content = content.to_string();
        doc
    }

    fn install(options: FeedConfig) -> Result<(Pipeline, HelperRegistry), PluginError> {
        let site = SiteMetadata {
            url: Some(BASE.to_string()),
            ..Default::default()
        };
        let mut host = PluginHost::new(Pipeline::default_pipeline(), HelperRegistry::default(), site);
        Feed::new(options).install(&mut host)?;
        Ok(host.into_parts())
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(absolute_url("/posts/a/", Some(BASE)), "https://notes.example.com/posts/a/");
        assert_eq!(absolute_url("/", Some("https://x.dev/")), "https://x.dev/");
        assert_eq!(absolute_url("https://other.dev/", Some(BASE)), "https://other.dev/");
        assert_eq!(absolute_url("//cdn.dev/a.js", Some(BASE)), "//cdn.dev/a.js");
        assert_eq!(absolute_url("/posts/a/", None), "/posts/a/");
    }

    #[test]
    fn test_html_to_absolute_urls() {
        let html = r##"<a href="/about/">About</a> <img src="/images/a.png"> <a href="https://x.dev">x</a> <a href="#top">top</a> <script src="//cdn.dev/a.js"></script>"##;
        assert_eq!(
            html_to_absolute_urls(html, Some(BASE)),
            r##"<a href="https://notes.example.com/about/">About</a> <img src="https://notes.example.com/images/a.png"> <a href="https://x.dev">x</a> <a href="#top">top</a> <script src="//cdn.dev/a.js"></script>"##
        );
    }

    #[test]
    fn test_collect_entries_newest_first_with_limit() {
        let docs = vec![
            doc("old", Some("2023-01-01"), &["posts"], "<p>old</p>"),
            doc("new", Some("2024-06-01"), &["posts"], "<p><a href=\"/old/\">old</a></p>"),
            doc("mid", Some("2024-01-01"), &["posts"], ""),
            doc("about", Some("2024-12-01"), &[], ""),
            doc("undated", None, &["posts"], ""),
        ];
        let options = FeedConfig {
            limit: 2,
            ..Default::default()
        };

        let entries = collect_entries(&docs, &options, Some(BASE));
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid"]);
        assert_eq!(entries[0].url, "https://notes.example.com/new/");
        assert_eq!(
            entries[0].content,
            "<p><a href=\"https://notes.example.com/old/\">old</a></p>"
        );
    }

    #[test]
    fn test_all_collection_takes_every_dated_page() {
        let docs = vec![
            doc("about", Some("2024-12-01"), &[], ""),
            doc("post", Some("2024-01-01"), &["posts"], ""),
            doc("undated", None, &[], ""),
        ];
        let options = FeedConfig {
            collection: ALL.to_string(),
            ..Default::default()
        };
        assert_eq!(collect_entries(&docs, &options, Some(BASE)).len(), 2);
    }

    #[test]
    fn test_render_feed() {
        let site = SiteMetadata {
            title: "Field Notes".to_string(),
            url: Some(BASE.to_string()),
            author: Some("Jane".to_string()),
            ..Default::default()
        };
        let entries = vec![FeedEntry {
            title: "Fish & Chips".to_string(),
            url: format!("{BASE}/posts/fish/"),
            updated: parse_date("2024-01-05").unwrap(),
            summary: None,
            content: "<p>Hi</p>".to_string(),
        }];

        let xml = render_feed(&site, &FeedConfig::default(), BASE, &entries);
        assert_eq!(
            xml,
            r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="en">
  <title>Field Notes</title>
  <link href="https://notes.example.com/feed.xml" rel="self"/>
  <link href="https://notes.example.com/"/>
  <updated>2024-01-05T00:00:00+00:00</updated>
  <id>https://notes.example.com/</id>
  <author>
    <name>Jane</name>
  </author>
  <entry>
    <title>Fish &amp; Chips</title>
    <link href="https://notes.example.com/posts/fish/"/>
    <updated>2024-01-05T00:00:00+00:00</updated>
    <id>https://notes.example.com/posts/fish/</id>
    <content type="html">&lt;p&gt;Hi&lt;/p&gt;</content>
  </entry>
</feed>
"#
        );
    }

    #[test]
    fn test_invalid_options_rejected() {
        let bad_path = FeedConfig {
            path: "/feed.json".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            install(bad_path),
            Err(PluginError::InvalidOptions { plugin: "feed", .. })
        ));

        let zero_limit = FeedConfig {
            limit: 0,
            ..Default::default()
        };
        assert!(install(zero_limit).is_err());
    }

    #[test]
    fn test_install_registers_stage_and_filters() {
        let (pipeline, helpers) = install(FeedConfig::default()).unwrap();
        assert_eq!(pipeline.finalize_stage_names(), vec!["feed"]);
        for name in [
            "date_to_rfc3339",
            "date_to_rfc822",
            "newest_collection_item_date",
            "absolute_url",
            "html_to_absolute_urls",
        ] {
            assert!(helpers.contains(name), "{name}");
        }
    }

    #[test]
    fn test_filters_in_templates() {
        let (_, helpers) = install(FeedConfig::default()).unwrap();
        let mut tera = tera::Tera::default();
        helpers.register_into(&mut tera);

        let out = tera
            .render_str(
                "{{ \"2024-01-05\" | date_to_rfc3339 }} {{ \"/a/\" | absolute_url }}",
                &tera::Context::new(),
            )
            .unwrap();
        assert_eq!(out, "2024-01-05T00:00:00+00:00 https://notes.example.com/a/");

        let err = tera.render_str("{{ \"soon\" | date_to_rfc3339 }}", &tera::Context::new());
        assert!(err.is_err());
    }

    #[test]
    fn test_newest_item_date() {
        let items = vec![
            json!({"title": "a", "date": "2024-01-05"}),
            json!({"title": "b", "date": "2024-03-01T10:00:00+02:00"}),
            json!({"title": "c", "date": null}),
            json!({"title": "d"}),
        ];
        assert_eq!(
            newest_item_date(&items).map(|d| d.to_rfc3339()).as_deref(),
            Some("2024-03-01T10:00:00+02:00")
        );
        assert_eq!(newest_item_date(&[json!({"title": "d"})]), None);
    }

    #[test]
    fn test_rss_date_filters_in_templates() {
        let (_, helpers) = install(FeedConfig::default()).unwrap();
        let mut tera = tera::Tera::default();
        helpers.register_into(&mut tera);

        let mut context = tera::Context::new();
        context.insert(
            "posts",
            &json!([{"date": "2023-06-01"}, {"date": "2024-01-15"}, {"title": "undated"}]),
        );
        context.insert("empty", &json!([]));

        let out = tera
            .render_str(
                "{{ posts | newest_collection_item_date }}|{{ \"2024-01-15\" | date_to_rfc822 }}",
                &context,
            )
            .unwrap();
        assert_eq!(out, "2024-01-15T00:00:00+00:00|Mon, 15 Jan 2024 00:00:00 +0000");

        let out = tera
            .render_str(
                "{{ empty | newest_collection_item_date(fallback=\"2020-02-12\") | date_to_rfc822 }}",
                &context,
            )
            .unwrap();
        assert_eq!(out, "Wed, 12 Feb 2020 00:00:00 +0000");

        assert!(tera.render_str("{{ empty | newest_collection_item_date }}", &context).is_err());
        assert!(tera.render_str("{{ \"soon\" | date_to_rfc822 }}", &context).is_err());
    }
}
