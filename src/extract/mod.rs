//! Pure parsers for the platform's pages
//!
//! Nothing in this module performs I/O. Each parser takes a fetched payload
//! and returns what it could recover; missing data becomes a field default.
//!
//! - [`listing`]: author index pages (article URLs plus a next-page hint)
//! - [`article`]: article pages into [`ArticleRecord`](crate::model::ArticleRecord)
//! - [`comments`]: response listings into [`CommentRecord`](crate::model::CommentRecord)
//! - [`embedded`]: JSON-LD and embedded application state
//! - [`numbers`]: abbreviated counts, read times and timestamps

pub mod article;
pub mod comments;
pub mod embedded;
pub mod listing;
pub mod numbers;
pub mod pagination;

pub use article::parse_article;
pub use comments::{parse_comment_page, CommentPage};
pub use embedded::EmbeddedData;
pub use listing::{parse_listing, ListingPage};
pub use pagination::NextPage;

use scraper::{ElementRef, Html, Selector};

/// Collapses runs of whitespace into single spaces
pub(crate) fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalized text of an element
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Text of the first element matching `css` that has any
pub(crate) fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .map(|element| element_text(&element))
        .find(|text| !text.is_empty())
}

/// Content of a `<meta>` tag looked up by `property` or `name`
pub(crate) fn meta_content(document: &Html, key: &str) -> Option<String> {
    meta_contents(document, key).into_iter().next()
}

/// Contents of every `<meta>` tag with the given `property` or `name`
pub(crate) fn meta_contents(document: &Html, key: &str) -> Vec<String> {
    let css = format!("meta[property='{key}'][content], meta[name='{key}'][content]");
    let Ok(selector) = Selector::parse(&css) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(clean_text)
        .filter(|content| !content.is_empty())
        .collect()
}
