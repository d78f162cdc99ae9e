//! Author listing parser
//!
//! Turns one page of an author's archive into the article URLs it links, in
//! page order, plus the hint for the page after it.

use crate::extract::embedded::{find_values, EmbeddedData};
use crate::extract::pagination::{detect_next_page, detect_next_page_json, NextPage};
use crate::url::canonical_article_url;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// Embedded keys holding an article's public URL
const URL_KEYS: &[&str] = &["mediumUrl", "canonicalUrl"];

/// Keys searched in JSON listing bodies
const JSON_URL_KEYS: &[&str] = &["mediumUrl", "canonicalUrl", "url"];

/// One parsed listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    /// Canonical article URLs in page order, without duplicates
    pub article_urls: Vec<Url>,

    pub next: NextPage,
}

/// Parses a listing page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags that point at an article
/// - `url` entries of a JSON-LD `ItemList`
/// - Article URLs in the embedded client state (`mediumUrl`, `canonicalUrl`)
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links, data URIs and fragment-only links
/// - Articles under another author's `@handle`
///
/// Bodies that are JSON documents rather than HTML are read the same way.
///
/// # Arguments
///
/// * `body` - The fetched listing page
/// * `page_url` - The URL the page was fetched from
///
/// # Example
///
/// ```
/// use byline::extract::parse_listing;
/// use url::Url;
///
/// let html = r#"<a href="/@writer/hello-world-1a2b3c4d5e6f?source=profile">Hello</a>"#;
/// let page_url = Url::parse("https://medium.com/@writer").unwrap();
/// let page = parse_listing(html, &page_url);
/// assert_eq!(page.article_urls[0].as_str(), "https://medium.com/@writer/hello-world-1a2b3c4d5e6f");
/// ```
pub fn parse_listing(body: &str, page_url: &Url) -> ListingPage {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
            return parse_listing_json(&json, page_url);
        }
    }

    let document = Html::parse_document(body);
    let embedded = EmbeddedData::from_document(&document);
    let mut collector = UrlCollector::new(page_url);

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                collector.push_href(href);
            }
        }
    }

    for list in embedded.linked_data_of_type(&["ItemList"]) {
        if let Some(Value::Array(items)) = list.get("itemListElement") {
            for item in items {
                let url = item
                    .get("url")
                    .or_else(|| item.get("item").and_then(|inner| inner.get("url")))
                    .and_then(Value::as_str);
                if let Some(url) = url {
                    collector.push_href(url);
                }
            }
        }
    }

    for key in URL_KEYS {
        for value in embedded.find_values(key) {
            if let Some(url) = value.as_str() {
                collector.push_href(url);
            }
        }
    }

    ListingPage {
        article_urls: collector.finish(),
        next: detect_next_page(&document, &embedded, page_url),
    }
}

fn parse_listing_json(json: &Value, page_url: &Url) -> ListingPage {
    let mut collector = UrlCollector::new(page_url);

    for key in JSON_URL_KEYS {
        let mut found = Vec::new();
        find_values(json, key, &mut found);
        for url in found.into_iter().filter_map(Value::as_str) {
            collector.push_href(url);
        }
    }

    ListingPage {
        article_urls: collector.finish(),
        next: detect_next_page_json(json, page_url),
    }
}

/// Accumulates canonical article URLs in first-seen order
struct UrlCollector<'a> {
    page_url: &'a Url,
    author_handle: Option<String>,
    seen: HashSet<String>,
    urls: Vec<Url>,
}

impl<'a> UrlCollector<'a> {
    fn new(page_url: &'a Url) -> Self {
        Self {
            page_url,
            author_handle: author_handle(page_url),
            seen: HashSet::new(),
            urls: Vec::new(),
        }
    }

    fn push_href(&mut self, href: &str) {
        let Some(absolute) = resolve_link(href, self.page_url) else {
            return;
        };
        let Some(canonical) = canonical_article_url(&absolute) else {
            return;
        };
        if self.belongs_to_other_author(&canonical) {
            return;
        }
        if self.seen.insert(canonical.as_str().to_string()) {
            self.urls.push(canonical);
        }
    }

    fn belongs_to_other_author(&self, url: &Url) -> bool {
        let Some(own) = &self.author_handle else {
            return false;
        };
        match author_handle(url) {
            Some(handle) => &handle != own,
            None => false,
        }
    }

    fn finish(self) -> Vec<Url> {
        self.urls
    }
}

/// The `@handle` path segment of a URL, lowercased
fn author_handle(url: &Url) -> Option<String> {
    url.path_segments()?
        .find(|segment| segment.starts_with('@') && segment.len() > 1)
        .map(str::to_lowercase)
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    matches!(absolute_url.scheme(), "http" | "https").then_some(absolute_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://medium.com/@writer").unwrap()
    }

    fn urls(page: &ListingPage) -> Vec<&str> {
        page.article_urls.iter().map(Url::as_str).collect()
    }

    #[test]
    fn test_collects_article_links_in_order() {
        let html = r#"
            <a href="/@writer/second-post-bbbbbbbb0002">Second</a>
            <a href="/@writer/first-post-aaaaaaaa0001">First</a>
            <a href="/@writer/about">About</a>
            <a href="/tag/rust">Rust</a>
        "#;
        let page = parse_listing(html, &page_url());

        assert_eq!(
            urls(&page),
            vec![
                "https://medium.com/@writer/second-post-bbbbbbbb0002",
                "https://medium.com/@writer/first-post-aaaaaaaa0001",
            ]
        );
        assert_eq!(page.next, NextPage::Unknown);
    }

    #[test]
    fn test_dedupes_tracking_variants() {
        let html = r#"
            <a href="/@writer/post-aaaaaaaa0001?source=user_profile">Title</a>
            <a href="https://medium.com/@writer/post-aaaaaaaa0001#responses">Responses</a>
            <a href="https://www.medium.com/@writer/post-aaaaaaaa0001/">Again</a>
        "#;
        let page = parse_listing(html, &page_url());
        assert_eq!(page.article_urls.len(), 1);
    }

    #[test]
    fn test_skips_other_authors_and_bad_schemes() {
        let html = r##"
            <a href="/@someone-else/their-post-cccccccc0003">Recommended</a>
            <a href="javascript:void(0)">JS</a>
            <a href="mailto:writer@example.com">Mail</a>
            <a href="#top">Top</a>
            <a href="/p/dddddddd0004">Short link</a>
        "##;
        let page = parse_listing(html, &page_url());
        assert_eq!(urls(&page), vec!["https://medium.com/p/dddddddd0004"]);
    }

    #[test]
    fn test_reading_lists_are_not_articles() {
        let html = r#"
            <a href="/@writer/list/reading-list-1f2e3d4c5b6a">Reading list</a>
            <a href="/@writer/real-post-aaaaaaaa0001">Post</a>
        "#;
        let page = parse_listing(html, &page_url());
        assert_eq!(urls(&page), vec!["https://medium.com/@writer/real-post-aaaaaaaa0001"]);
    }

    #[test]
    fn test_publication_links_are_kept() {
        let html = r#"<a href="https://blog.example.com/a-story-eeeeeeee0005">Story</a>"#;
        let page = parse_listing(html, &page_url());
        assert_eq!(page.article_urls.len(), 1);
    }

    #[test]
    fn test_item_list_and_embedded_urls() {
        let html = r#"
            <script type="application/ld+json">
            {"@type":"ItemList","itemListElement":[
                {"@type":"ListItem","url":"https://medium.com/@writer/one-aaaaaaaa0001"},
                {"@type":"ListItem","item":{"url":"https://medium.com/@writer/two-bbbbbbbb0002"}}
            ]}
            </script>
            <script>window.__APOLLO_STATE__ = {"Post:3":{"mediumUrl":"https://medium.com/@writer/three-cccccccc0003"},"paging":{"next":{"to":"42"}}};</script>
        "#;
        let page = parse_listing(html, &page_url());

        assert_eq!(page.article_urls.len(), 3);
        assert_eq!(
            page.next,
            NextPage::Token {
                key: "to".to_string(),
                value: "42".to_string()
            }
        );
    }

    #[test]
    fn test_json_listing_body() {
        let body = r#"{"payload":{"posts":[
            {"mediumUrl":"https://medium.com/@writer/one-aaaaaaaa0001"},
            {"mediumUrl":"https://medium.com/@writer/two-bbbbbbbb0002"}
        ]},"paging":{}}"#;
        let page = parse_listing(body, &page_url());

        assert_eq!(page.article_urls.len(), 2);
        assert_eq!(page.next, NextPage::End);
    }

    #[test]
    fn test_subdomain_author_keeps_all_articles() {
        let page_url = Url::parse("https://writer.medium.com/").unwrap();
        let html = r#"<a href="/why-rust-aaaaaaaa0001">Why Rust</a>"#;
        let page = parse_listing(html, &page_url);
        assert_eq!(
            urls(&page),
            vec!["https://writer.medium.com/why-rust-aaaaaaaa0001"]
        );
    }
}
