//! Next-page detection for paginated listings
//!
//! The hint is read, in order of preference, from:
//! 1. An explicit `<link rel="next">` / `<a rel="next">`
//! 2. An embedded `paging` object: `paging.next.{to,from,cursor}` is a token,
//!    `paging.next` as a string is a URL, and `paging` without `next` is the end
//! 3. Nothing found: [`NextPage::Unknown`], so the caller may try a page number

use crate::extract::embedded::EmbeddedData;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

/// Keys of `paging.next` that carry a continuation token
const TOKEN_KEYS: &[&str] = &["to", "from", "cursor"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// The platform links the next page directly
    Url(Url),

    /// Continuation token, sent back under the query key it was read from
    Token { key: String, value: String },

    /// The platform reports there are no further pages
    End,

    /// No pagination hint at all
    Unknown,
}

impl NextPage {
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

/// Detects the next page of an HTML listing
pub fn detect_next_page(document: &Html, embedded: &EmbeddedData, page_url: &Url) -> NextPage {
    if let Some(url) = next_link(document, page_url) {
        return NextPage::Url(url);
    }

    next_from_values(&embedded.find_values("paging"), page_url).unwrap_or(NextPage::Unknown)
}

/// Detects the next page of a JSON listing body
pub fn detect_next_page_json(body: &Value, page_url: &Url) -> NextPage {
    let mut pagings = Vec::new();
    crate::extract::embedded::find_values(body, "paging", &mut pagings);
    next_from_values(&pagings, page_url).unwrap_or(NextPage::Unknown)
}

fn next_link(document: &Html, page_url: &Url) -> Option<Url> {
    let selector = Selector::parse("link[rel='next'][href], a[rel='next'][href]").ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .find_map(|href| page_url.join(href.trim()).ok())
        .filter(|url| url != page_url)
}

/// Reads a hint from the `paging` objects found on a page
///
/// Returns `None` when there are no `paging` objects at all.
fn next_from_values(pagings: &[&Value], page_url: &Url) -> Option<NextPage> {
    let pagings: Vec<&Value> = pagings.iter().copied().filter(|p| p.is_object()).collect();
    if pagings.is_empty() {
        return None;
    }

    for paging in &pagings {
        match paging.get("next") {
            Some(Value::Object(next)) => {
                let token = TOKEN_KEYS.iter().find_map(|key| {
                    next.get(*key)
                        .and_then(token_string)
                        .map(|value| (key.to_string(), value))
                });
                if let Some((key, value)) = token {
                    return Some(NextPage::Token { key, value });
                }
            }
            Some(Value::String(next)) if !next.trim().is_empty() => {
                if let Ok(url) = page_url.join(next.trim()) {
                    return Some(NextPage::Url(url));
                }
            }
            _ => {}
        }
    }

    Some(NextPage::End)
}

fn token_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
