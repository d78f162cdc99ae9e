//! Response (comment) listing parser
//!
//! Comments are read from `[data-comment-id]` elements and from embedded
//! `responses`/`comments` arrays, either in a page's client state or in a
//! JSON body. The parent of a comment is only ever taken from an explicit
//! field; nesting in the markup is not interpreted.

use crate::extract::embedded::{find_values, EmbeddedData};
use crate::extract::numbers::{parse_timestamp, timestamp_from_value};
use crate::extract::pagination::{detect_next_page, detect_next_page_json, NextPage};
use crate::extract::{clean_text, element_text};
use crate::model::CommentRecord;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

const ARRAY_KEYS: &[&str] = &["responses", "comments"];
const ID_KEYS: &[&str] = &["id", "commentId", "postId"];
const TEXT_KEYS: &[&str] = &["text", "content", "body"];
const TIME_KEYS: &[&str] = &["createdAt", "postedAt", "created_at", "firstPublishedAt"];
const PARENT_KEYS: &[&str] = &["parentId", "inResponseToCommentId", "inResponseToPostId"];

/// One parsed page of comments
#[derive(Debug, Clone, PartialEq)]
pub struct CommentPage {
    /// Comments in page order, unique by id within the page
    pub comments: Vec<CommentRecord>,

    pub next: NextPage,
}

/// Parses one page of an article's responses
///
/// # Arguments
///
/// * `body` - The fetched page, HTML or JSON
/// * `page_url` - The URL the page was fetched from
pub fn parse_comment_page(body: &str, page_url: &Url) -> CommentPage {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
            let mut collector = CommentCollector::default();
            collector.extend_from_json(&json);
            return CommentPage {
                comments: collector.comments,
                next: detect_next_page_json(&json, page_url),
            };
        }
    }

    let document = Html::parse_document(body);
    let embedded = EmbeddedData::from_document(&document);
    let mut collector = CommentCollector::default();

    if let Ok(selector) = Selector::parse("[data-comment-id]") {
        for element in document.select(&selector) {
            if let Some(comment) = comment_from_element(&element) {
                collector.push(comment);
            }
        }
    }

    for root in &embedded.app_state {
        collector.extend_from_json(root);
    }

    CommentPage {
        comments: collector.comments,
        next: detect_next_page(&document, &embedded, page_url),
    }
}

#[derive(Default)]
struct CommentCollector {
    seen: HashSet<String>,
    comments: Vec<CommentRecord>,
}

impl CommentCollector {
    fn push(&mut self, comment: CommentRecord) {
        if self.seen.insert(comment.id.clone()) {
            self.comments.push(comment);
        }
    }

    fn extend_from_json(&mut self, root: &Value) {
        for key in ARRAY_KEYS {
            let mut arrays = Vec::new();
            find_values(root, key, &mut arrays);
            for item in arrays.into_iter().filter_map(Value::as_array).flatten() {
                if let Some(comment) = comment_from_json(item) {
                    self.push(comment);
                }
            }
        }
    }
}

fn comment_from_element(element: &ElementRef<'_>) -> Option<CommentRecord> {
    let attrs = element.value();
    let id = attrs.attr("data-comment-id").map(str::trim)?;
    if id.is_empty() {
        return None;
    }

    let author = attrs
        .attr("data-author")
        .map(clean_text)
        .or_else(|| own_text(element, ".comment-author"))
        .unwrap_or_default();

    let text = own_text(element, ".comment-body")
        .or_else(|| own_paragraphs(element))
        .unwrap_or_default();

    let posted_at = attrs
        .attr("data-posted-at")
        .and_then(parse_timestamp)
        .or_else(|| {
            own_elements(element, "time[datetime]")
                .into_iter()
                .filter_map(|time| time.value().attr("datetime"))
                .find_map(parse_timestamp)
        });

    let parent_id = attrs
        .attr("data-parent-id")
        .map(str::trim)
        .filter(|parent| !parent.is_empty())
        .map(str::to_string);

    Some(CommentRecord {
        id: id.to_string(),
        author,
        text,
        posted_at,
        parent_id,
    })
}

/// Descendants matching `css` that belong to this comment, not a nested one
fn own_elements<'a>(comment: &ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };

    comment
        .select(&selector)
        .filter(|element| {
            element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|ancestor| ancestor.value().attr("data-comment-id").is_some())
                .map_or(true, |owner| owner.id() == comment.id())
        })
        .collect()
}

fn own_text(comment: &ElementRef<'_>, css: &str) -> Option<String> {
    own_elements(comment, css)
        .iter()
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn own_paragraphs(comment: &ElementRef<'_>) -> Option<String> {
    let paragraphs: Vec<String> = own_elements(comment, "p")
        .iter()
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect();
    (!paragraphs.is_empty()).then(|| paragraphs.join("\n\n"))
}

fn comment_from_json(item: &Value) -> Option<CommentRecord> {
    let id = ID_KEYS
        .iter()
        .filter_map(|key| item.get(*key))
        .find_map(id_string)?;

    let author = match item.get("author").or_else(|| item.get("creator")) {
        Some(Value::String(name)) => clean_text(name),
        Some(person) => person
            .get("name")
            .and_then(Value::as_str)
            .map(clean_text)
            .unwrap_or_default(),
        None => item
            .get("authorName")
            .and_then(Value::as_str)
            .map(clean_text)
            .unwrap_or_default(),
    };

    let text = TEXT_KEYS
        .iter()
        .filter_map(|key| item.get(*key))
        .find_map(|value| match value {
            Value::String(text) => Some(text.trim().to_string()),
            Value::Object(inner) => inner
                .get("text")
                .and_then(Value::as_str)
                .map(|text| text.trim().to_string()),
            _ => None,
        })
        .unwrap_or_default();

    let posted_at = TIME_KEYS
        .iter()
        .filter_map(|key| item.get(*key))
        .find_map(timestamp_from_value);

    let parent_id = PARENT_KEYS
        .iter()
        .filter_map(|key| item.get(*key))
        .find_map(id_string);

    Some(CommentRecord {
        id,
        author,
        text,
        posted_at,
        parent_id,
    })
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
