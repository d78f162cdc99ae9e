//! Article page parser
//!
//! Every field is an independent projection over the parsed document and
//! its embedded data. A projection that finds nothing yields the field's
//! default; only a missing title rejects the page.

use crate::extract::embedded::{find_values, EmbeddedData};
use crate::extract::numbers::{
    count_from_value, parse_count, parse_read_time, parse_timestamp, timestamp_from_value,
};
use crate::extract::{clean_text, element_text, first_text, meta_content, meta_contents};
use crate::model::ArticleRecord;
use crate::url::{article_id, canonical_article_url};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::BTreeSet;
use url::Url;

/// Elements whose text makes up the body
const BODY_BLOCKS: &str = "p, h1, h2, h3, h4, pre, li, blockquote, figcaption";

/// Block tags whose descendants are already covered by their own text
const BLOCK_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "pre", "li", "blockquote", "figcaption"];

const SUBTITLE_SELECTORS: &[&str] = &["h2.pw-subtitle-paragraph", ".subtitle", "h2.graf--subtitle"];

const CLAP_SELECTORS: &[&str] = &[
    "[data-testid='clapCount']",
    ".clap-count",
    "button[data-action='show-recommends']",
];

const READ_TIME_SELECTORS: &[&str] = &["[data-testid='storyReadTime']", ".readingTime"];

/// `keywords` prefixes the platform uses for post metadata
const KEYWORD_MARKERS: &[&str] = &[
    "Publication:",
    "Elevated:",
    "LockedPostSource:",
    "Lite:",
    "Layout:",
    "Source:",
    "Subscription:",
    "Topic:",
];

/// Parses an article page into a record
///
/// Returns `None` only when no title can be recovered.
///
/// # Arguments
///
/// * `url` - The article URL the page was fetched from
/// * `html` - The fetched page
///
/// # Example
///
/// ```
/// use byline::extract::parse_article;
/// use url::Url;
///
/// let url = Url::parse("https://medium.com/@writer/hello-1a2b3c4d5e6f").unwrap();
/// let html = r#"<html><head><title>Hello | by Writer | Medium</title></head>
///     <body><article><p>First paragraph.</p></article></body></html>"#;
///
/// let article = parse_article(&url, html).unwrap();
/// assert_eq!(article.title, "Hello");
/// assert_eq!(article.body_text, "First paragraph.");
/// assert!(article.tags.is_empty());
/// ```
pub fn parse_article(url: &Url, html: &str) -> Option<ArticleRecord> {
    let document = Html::parse_document(html);
    let embedded = EmbeddedData::from_document(&document);
    let canonical = canonical_article_url(url).unwrap_or_else(|| url.clone());
    let id = article_id(&canonical);
    let page = ArticlePage {
        document: &document,
        embedded: &embedded,
        linked: embedded.article_object(),
        post: id
            .as_deref()
            .and_then(|id| embedded.state_entry(&format!("Post:{}", id))),
    };

    let title = page.title()?;
    let subtitle = page.subtitle().unwrap_or_default();
    let body_text = page.body_text(&title, &subtitle).unwrap_or_default();

    Some(ArticleRecord {
        url: canonical.to_string(),
        id,
        title,
        subtitle,
        author: page.author(),
        published_at: page.published_at(),
        tags: page.tags(),
        claps: page.claps().unwrap_or(0),
        read_time_minutes: page.read_time(),
        body_text,
        comments: Vec::new(),
    })
}

/// A parsed article page and its embedded data
struct ArticlePage<'a> {
    document: &'a Html,
    embedded: &'a EmbeddedData,

    /// The JSON-LD object describing the article, if any
    linked: Option<&'a Value>,

    /// The client-state entry of this post; related posts live next to it
    post: Option<&'a Value>,
}

impl<'a> ArticlePage<'a> {
    /// Values under `key` in this post's state entry, or anywhere in the
    /// client state when the page has no such entry
    fn state_values(&self, key: &str) -> Vec<&'a Value> {
        match self.post {
            Some(post) => {
                let mut found = Vec::new();
                find_values(post, key, &mut found);
                found
            }
            None => self.embedded.find_values(key),
        }
    }

    fn linked_str(&self, key: &str) -> Option<String> {
        self.linked
            .and_then(|ld| ld.get(key))
            .and_then(Value::as_str)
            .map(clean_text)
            .filter(|s| !s.is_empty())
    }

    fn title(&self) -> Option<String> {
        self.linked_str("headline")
            .or_else(|| self.linked_str("name"))
            .or_else(|| meta_content(self.document, "og:title"))
            .or_else(|| first_text(self.document, "h1"))
            .or_else(|| {
                first_text(self.document, "title")
                    .map(|title| strip_title_suffix(&title))
                    .filter(|title| !title.is_empty())
            })
    }

    fn subtitle(&self) -> Option<String> {
        SUBTITLE_SELECTORS
            .iter()
            .find_map(|css| first_text(self.document, css))
            .or_else(|| self.linked_str("description"))
            .or_else(|| meta_content(self.document, "og:description"))
            .or_else(|| meta_content(self.document, "description"))
    }

    fn author(&self) -> Option<String> {
        let from_linked = self
            .linked
            .and_then(|ld| ld.get("author"))
            .map(author_names)
            .unwrap_or_default();

        if !from_linked.is_empty() {
            return Some(from_linked.join(", "));
        }
        meta_content(self.document, "author")
    }

    fn published_at(&self) -> Option<DateTime<Utc>> {
        self.linked_str("datePublished")
            .and_then(|date| parse_timestamp(&date))
            .or_else(|| {
                meta_content(self.document, "article:published_time")
                    .and_then(|date| parse_timestamp(&date))
            })
            .or_else(|| {
                self.state_values("firstPublishedAt")
                    .into_iter()
                    .find_map(timestamp_from_value)
            })
            .or_else(|| {
                let selector = Selector::parse("time[datetime]").ok()?;
                self.document
                    .select(&selector)
                    .filter_map(|time| time.value().attr("datetime"))
                    .find_map(parse_timestamp)
            })
    }

    /// Tags from the first source that has any
    fn tags(&self) -> BTreeSet<String> {
        let sources: [&dyn Fn() -> Vec<String>; 4] = [
            &|| self.keyword_tags(),
            &|| meta_contents(self.document, "article:tag"),
            &|| self.linked_tags(),
            &|| self.embedded_tags(),
        ];

        sources
            .iter()
            .map(|source| normalize_tags(source()))
            .find(|tags| !tags.is_empty())
            .unwrap_or_default()
    }

    fn keyword_tags(&self) -> Vec<String> {
        let entries: Vec<String> = match self.linked.and_then(|ld| ld.get("keywords")) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(list)) => list.split(',').map(str::to_string).collect(),
            _ => Vec::new(),
        };

        entries
            .iter()
            .filter_map(|entry| keyword_to_tag(entry))
            .collect()
    }

    /// Tags shown as `/tag/<slug>` links
    fn linked_tags(&self) -> Vec<String> {
        let Ok(selector) = Selector::parse("a[href*='/tag/']") else {
            return Vec::new();
        };

        self.document
            .select(&selector)
            .filter_map(|link| {
                let text = element_text(&link);
                if !text.is_empty() {
                    return Some(text);
                }
                link.value()
                    .attr("href")
                    .and_then(|href| href.split("/tag/").nth(1))
                    .and_then(|rest| rest.split(&['/', '?', '#'][..]).next())
                    .map(|slug| slug.replace('-', " "))
            })
            .collect()
    }

    /// Tags from the client state: arrays of strings or tag objects
    fn embedded_tags(&self) -> Vec<String> {
        self.state_values("tags")
            .into_iter()
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(embedded_tag_name)
            .collect()
    }

    fn claps(&self) -> Option<u64> {
        self.state_values("clapCount")
            .into_iter()
            .find_map(count_from_value)
            .or_else(|| {
                CLAP_SELECTORS
                    .iter()
                    .filter_map(|css| first_text(self.document, css))
                    .find_map(|text| parse_count(&text))
            })
    }

    fn read_time(&self) -> Option<f64> {
        self.state_values("readingTime")
            .into_iter()
            .find_map(Value::as_f64)
            .or_else(|| {
                meta_content(self.document, "twitter:data1")
                    .filter(|text| text.contains("min"))
                    .and_then(|text| parse_read_time(&text))
            })
            .or_else(|| {
                READ_TIME_SELECTORS
                    .iter()
                    .filter_map(|css| first_text(self.document, css))
                    .find_map(|text| parse_read_time(&text))
            })
            .or_else(|| {
                self.linked_str("timeRequired")
                    .and_then(|text| parse_read_time(&text))
            })
    }

    /// Block texts of the article container joined by blank lines
    fn body_text(&self, title: &str, subtitle: &str) -> Option<String> {
        let container = ["article", "main"].iter().find_map(|css| {
            let selector = Selector::parse(css).ok()?;
            self.document.select(&selector).next()
        });

        if let Some(container) = container {
            let blocks = block_texts(container, title, subtitle);
            if !blocks.is_empty() {
                return Some(blocks.join("\n\n"));
            }
        }

        self.linked
            .and_then(|ld| ld.get("articleBody"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|body| !body.is_empty())
            .map(str::to_string)
    }
}

fn block_texts(container: ElementRef<'_>, title: &str, subtitle: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(BODY_BLOCKS) else {
        return Vec::new();
    };

    container
        .select(&selector)
        .filter(|block| !is_nested_block(block, &container))
        .map(|block| element_text(&block))
        .filter(|text| !text.is_empty() && text != title && text != subtitle)
        .collect()
}

/// Returns true if a block sits inside another block of the container
fn is_nested_block(block: &ElementRef<'_>, container: &ElementRef<'_>) -> bool {
    for ancestor in block.ancestors() {
        if ancestor.id() == container.id() {
            return false;
        }
        if let Some(element) = ElementRef::wrap(ancestor) {
            if BLOCK_TAGS.contains(&element.value().name()) {
                return true;
            }
        }
    }
    false
}

/// Removes " | by Author | Medium" style suffixes from a `<title>`
fn strip_title_suffix(title: &str) -> String {
    let head = match title.find(" | by ") {
        Some(end) => &title[..end],
        None => title,
    };
    let head = head.trim_end();
    let head = ["| Medium", "- Medium", "– Medium"]
        .iter()
        .find_map(|suffix| head.strip_suffix(suffix))
        .unwrap_or(head);
    head.trim().to_string()
}

/// Author names from a JSON-LD `author` (object, array or string)
fn author_names(author: &Value) -> Vec<String> {
    match author {
        Value::Array(items) => items.iter().flat_map(author_names).collect(),
        Value::Object(obj) => obj
            .get("name")
            .and_then(Value::as_str)
            .map(clean_text)
            .filter(|name| !name.is_empty())
            .into_iter()
            .collect(),
        Value::String(name) => {
            let name = clean_text(name);
            if name.is_empty() {
                Vec::new()
            } else {
                vec![name]
            }
        }
        _ => Vec::new(),
    }
}

/// Maps one `keywords` entry to a tag
///
/// `Tag:rust` is unwrapped and the platform's own markers are dropped.
/// Anything else, colons included, is kept as written.
fn keyword_to_tag(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if let Some(tag) = entry.strip_prefix("Tag:") {
        return Some(tag.to_string());
    }
    if KEYWORD_MARKERS
        .iter()
        .any(|marker| entry.starts_with(marker))
    {
        return None;
    }
    Some(entry.to_string())
}

fn embedded_tag_name(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name.clone()),
        Value::Object(obj) => ["displayTitle", "name", "id"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .or_else(|| {
                obj.get("__ref")
                    .and_then(Value::as_str)
                    .and_then(|reference| reference.strip_prefix("Tag:"))
                    .map(str::to_string)
            }),
        _ => None,
    }
}

/// Trims, lowercases and deduplicates tags, dropping empty ones
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| clean_text(tag.as_ref()).to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn url() -> Url {
        Url::parse("https://medium.com/@writer/why-rust-1a2b3c4d5e6f?source=profile").unwrap()
    }

    const FULL_PAGE: &str = r#"
        <html>
        <head>
            <title>Why Rust | by Ada | Medium</title>
            <meta property="og:title" content="Why Rust (OG)">
            <meta name="twitter:data1" content="7 min read">
            <script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@type": "NewsArticle",
                "headline": "Why Rust",
                "description": "Notes on ownership",
                "author": {"@type": "Person", "name": "Ada Lovelace"},
                "datePublished": "2023-04-05T10:20:30.000Z",
                "keywords": ["Tag:Rust", "Tag:Programming", "Elevated:false", "LockedPostSource:0"]
            }
            </script>
            <script>window.__APOLLO_STATE__ = {"Post:1a2b3c4d5e6f":{"clapCount":1234,"readingTime":6.5}};</script>
        </head>
        <body>
            <article>
                <h1>Why Rust</h1>
                <h2 class="pw-subtitle-paragraph">Notes on ownership</h2>
                <p>Ownership is the core idea.</p>
                <ul><li><p>Borrowing</p></li><li>Lifetimes</li></ul>
                <blockquote><p>Fearless concurrency.</p></blockquote>
                <pre>fn main() {}</pre>
            </article>
        </body>
        </html>
    "#;

    #[test]
    fn test_full_page() {
        let article = parse_article(&url(), FULL_PAGE).unwrap();

        assert_eq!(article.url, "https://medium.com/@writer/why-rust-1a2b3c4d5e6f");
        assert_eq!(article.id.as_deref(), Some("1a2b3c4d5e6f"));
        assert_eq!(article.title, "Why Rust");
        assert_eq!(article.subtitle, "Notes on ownership");
        assert_eq!(article.author.as_deref(), Some("Ada Lovelace"));
        assert_eq!(article.published_at.unwrap().year(), 2023);
        assert_eq!(
            article.tags.iter().collect::<Vec<_>>(),
            vec!["programming", "rust"]
        );
        assert_eq!(article.claps, 1234);
        assert_eq!(article.read_time_minutes, Some(6.5));
        assert_eq!(
            article.body_text,
            "Ownership is the core idea.\n\nBorrowing\n\nLifetimes\n\nFearless concurrency.\n\nfn main() {}"
        );
        assert!(article.comments.is_empty());
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let html = "<html><body><article><p>Just text</p></article></body></html>";
        assert!(parse_article(&url(), html).is_none());
    }

    #[test]
    fn test_sparse_page_uses_defaults() {
        let html = "<html><head><title>Bare</title></head><body></body></html>";
        let article = parse_article(&url(), html).unwrap();

        assert_eq!(article.title, "Bare");
        assert_eq!(article.subtitle, "");
        assert!(article.author.is_none());
        assert!(article.published_at.is_none());
        assert!(article.tags.is_empty());
        assert_eq!(article.claps, 0);
        assert!(article.read_time_minutes.is_none());
        assert_eq!(article.body_text, "");
    }

    #[test]
    fn test_dom_fallbacks() {
        let html = r#"
            <html><head>
                <meta name="author" content="Grace Hopper">
                <meta name="twitter:data1" content="4 min read">
            </head><body>
                <main>
                    <h1>Compilers</h1>
                    <time datetime="2022-01-02">Jan 2</time>
                    <p>Body text.</p>
                    <button data-testid="clapCount">1.2K</button>
                    <a href="/tag/machine-learning">Machine Learning</a>
                    <a href="https://medium.com/tag/ai?source=post"></a>
                </main>
            </body></html>
        "#;
        let article = parse_article(&url(), html).unwrap();

        assert_eq!(article.title, "Compilers");
        assert_eq!(article.author.as_deref(), Some("Grace Hopper"));
        assert_eq!(article.published_at.unwrap().day(), 2);
        assert_eq!(article.claps, 1200);
        assert_eq!(article.read_time_minutes, Some(4.0));
        assert!(article.has_tag("machine learning"));
        assert!(article.has_tag("ai"));
        assert!(article.body_text.contains("Body text."));
    }

    #[test]
    fn test_tag_normalization() {
        let tags = normalize_tags(["Tech", "tech", " AI ", ""]);
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["ai", "tech"]);
    }

    #[test]
    fn test_keyword_string_and_meta_tags() {
        let html = r#"<head>
            <script type="application/ld+json">{"@type":"Article","headline":"T","keywords":"Rust, WebAssembly"}</script>
        </head>"#;
        let article = parse_article(&url(), html).unwrap();
        assert!(article.has_tag("rust"));
        assert!(article.has_tag("webassembly"));

        let html = r#"<head><title>T</title>
            <meta property="article:tag" content="Databases">
        </head>"#;
        let article = parse_article(&url(), html).unwrap();
        assert!(article.has_tag("databases"));
    }

    #[test]
    fn test_embedded_tag_objects() {
        let html = r#"<head><title>T</title>
            <script>window.__APOLLO_STATE__ = {"Post:1":{"tags":[{"__ref":"Tag:systems"},{"displayTitle":"Open Source"}]}};</script>
        </head>"#;
        let article = parse_article(&url(), html).unwrap();
        assert_eq!(
            article.tags.into_iter().collect::<Vec<_>>(),
            vec!["open source", "systems"]
        );
    }

    #[test]
    fn test_author_array() {
        let author = serde_json::json!([{"name": "Ada"}, "Grace", {"url": "x"}]);
        assert_eq!(author_names(&author), vec!["Ada", "Grace"]);
    }

    #[test]
    fn test_keyword_markers() {
        assert_eq!(keyword_to_tag("Tag:Rust"), Some("Rust".to_string()));
        assert_eq!(keyword_to_tag("Publication:towards"), None);
        assert_eq!(keyword_to_tag("Elevated:false"), None);
        assert_eq!(keyword_to_tag("LockedPostSource:0"), None);
        assert_eq!(keyword_to_tag("rust"), Some("rust".to_string()));
        assert_eq!(keyword_to_tag("C++: basics"), Some("C++: basics".to_string()));
        assert_eq!(keyword_to_tag("Note:draft"), Some("Note:draft".to_string()));
    }

    #[test]
    fn test_colon_keywords_become_tags() {
        let html = r#"<head><script type="application/ld+json">
            {"@type":"Article","headline":"T","keywords":["Tag:Rust","C++: basics","Publication:towards"]}
        </script></head>"#;
        let article = parse_article(&url(), html).unwrap();
        assert_eq!(
            article.tags.into_iter().collect::<Vec<_>>(),
            vec!["c++: basics", "rust"]
        );
    }

    #[test]
    fn test_strip_title_suffix() {
        assert_eq!(strip_title_suffix("Why Rust | by Ada | Medium"), "Why Rust");
        assert_eq!(strip_title_suffix("Why Rust - Medium"), "Why Rust");
        assert_eq!(strip_title_suffix("Plain"), "Plain");
        assert_eq!(
            strip_title_suffix("Rust vs Go | Part 2 | by Ada | Medium"),
            "Rust vs Go | Part 2"
        );
        assert_eq!(strip_title_suffix("| Medium"), "");
    }

    #[test]
    fn test_headline_keeps_pipes() {
        let html = r#"<head>
            <title>Rust vs Go | by Ada | Medium</title>
            <script type="application/ld+json">{"@type":"Article","headline":"Rust vs Go | Part 2"}</script>
        </head>"#;
        let article = parse_article(&url(), html).unwrap();
        assert_eq!(article.title, "Rust vs Go | Part 2");
    }

    #[test]
    fn test_suffix_only_title_falls_through() {
        let html = "<head><title> | Medium</title></head><body><h1>Real Title</h1></body>";
        let article = parse_article(&url(), html).unwrap();
        assert_eq!(article.title, "Real Title");

        let html = "<head><title> | Medium</title></head><body></body>";
        assert!(parse_article(&url(), html).is_none());
    }

    #[test]
    fn test_embedded_fields_come_from_own_post() {
        let url = Url::parse("https://medium.com/@writer/own-post-bbbbbbbbbbbb").unwrap();
        let html = r#"<head><title>Own</title>
            <script>window.__APOLLO_STATE__ = {
                "Post:aaaaaaaaaaaa":{"clapCount":9999,"readingTime":20,"firstPublishedAt":1600000000000,"tags":["cooking"]},
                "Post:bbbbbbbbbbbb":{"clapCount":5,"readingTime":3.5,"firstPublishedAt":1690000000000,"tags":["rust"]}
            };</script>
        </head>"#;
        let article = parse_article(&url, html).unwrap();

        assert_eq!(article.claps, 5);
        assert_eq!(article.read_time_minutes, Some(3.5));
        assert_eq!(article.published_at.unwrap().year(), 2023);
        assert_eq!(article.tags.into_iter().collect::<Vec<_>>(), vec!["rust"]);
    }

    #[test]
    fn test_body_falls_back_to_article_body() {
        let html = r#"<head><script type="application/ld+json">
            {"@type":"BlogPosting","headline":"T","articleBody":"  From JSON-LD  "}
        </script></head>"#;
        let article = parse_article(&url(), html).unwrap();
        assert_eq!(article.body_text, "From JSON-LD");
    }
}
