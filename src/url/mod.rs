//! URL handling module for Byline
//!
//! This module provides URL normalization, article URL recognition and
//! post id extraction for the platform's URL scheme:
//!
//! - `https://medium.com/@writer/some-title-1a2b3c4d5e6f`
//! - `https://publication.example/some-title-1a2b3c4d5e6f`
//! - `https://medium.com/p/1a2b3c4d5e6f`

mod normalize;

pub use normalize::normalize_url;

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Path segments whose pages never hold articles
const RESERVED_SECTIONS: &[&str] = &[
    "tag", "tagged", "topic", "topics", "m", "about", "followers", "following", "lists", "list",
    "search", "plans", "membership", "me", "signin", "responses",
];

fn slug_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|-)([0-9a-f]{8,12})$").expect("post id pattern is valid")
    })
}

/// Extracts the platform post id from an article URL
///
/// # Examples
///
/// ```
/// use byline::url::article_id;
/// use url::Url;
///
/// let url = Url::parse("https://medium.com/@writer/my-post-1a2b3c4d5e6f").unwrap();
/// assert_eq!(article_id(&url), Some("1a2b3c4d5e6f".to_string()));
///
/// let url = Url::parse("https://medium.com/@writer").unwrap();
/// assert_eq!(article_id(&url), None);
/// ```
pub fn article_id(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();

    // Short links: /p/<id>
    if let ["p", id] = segments.as_slice() {
        return is_post_id(id).then(|| id.to_string());
    }

    // Reserved sections can sit under a handle too: /@writer/list/<slug>
    if segments
        .iter()
        .any(|segment| RESERVED_SECTIONS.contains(segment))
    {
        return None;
    }

    let last = segments.last()?;
    if last.starts_with('@') {
        return None;
    }

    slug_id_pattern()
        .captures(last)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

fn is_post_id(candidate: &str) -> bool {
    (8..=12).contains(&candidate.len())
        && candidate
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Returns true if the URL points at an article page
pub fn is_article_url(url: &Url) -> bool {
    article_id(url).is_some()
}

/// Canonical form of an article URL: normalized, without any query string
///
/// Returns `None` for anything that is not an article.
pub fn canonical_article_url(url: &Url) -> Option<Url> {
    let mut canonical = normalize_url(url.as_str()).ok()?;
    canonical.set_query(None);
    is_article_url(&canonical).then_some(canonical)
}

/// Key used for per-host bookkeeping (`host` or `host:port`)
pub fn host_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_article_id_from_slug() {
        assert_eq!(
            article_id(&url("https://medium.com/@writer/why-rust-1a2b3c4d5e6f")),
            Some("1a2b3c4d5e6f".to_string())
        );
        assert_eq!(
            article_id(&url("https://blog.example.com/why-rust-abcdef0123")),
            Some("abcdef0123".to_string())
        );
    }

    #[test]
    fn test_article_id_from_short_link() {
        assert_eq!(
            article_id(&url("https://medium.com/p/1a2b3c4d5e6f")),
            Some("1a2b3c4d5e6f".to_string())
        );
    }

    #[test]
    fn test_non_article_urls() {
        assert!(!is_article_url(&url("https://medium.com/@writer")));
        assert!(!is_article_url(&url("https://medium.com/@writer/about")));
        assert!(!is_article_url(&url("https://medium.com/tag/rust-1a2b3c4d")));
        assert!(!is_article_url(&url("https://medium.com/p/1a2b3c4d5e6f/responses")));
        assert!(!is_article_url(&url("https://medium.com/@writer/why-rust")));
    }

    #[test]
    fn test_reserved_section_under_handle() {
        assert!(!is_article_url(&url(
            "https://medium.com/@writer/list/reading-list-1f2e3d4c5b6a"
        )));
        assert!(!is_article_url(&url(
            "https://medium.com/@writer/lists/saved-1f2e3d4c5b6a"
        )));
        assert!(is_article_url(&url(
            "https://medium.com/@writer/listing-tips-1f2e3d4c5b6a"
        )));
    }

    #[test]
    fn test_uppercase_hex_is_not_an_id() {
        assert!(!is_article_url(&url("https://medium.com/@writer/post-1A2B3C4D5E6F")));
    }

    #[test]
    fn test_canonical_article_url() {
        let canonical = canonical_article_url(&url(
            "https://www.medium.com/@writer/why-rust-1a2b3c4d5e6f/?source=profile&page=1#top",
        ))
        .unwrap();
        assert_eq!(
            canonical.as_str(),
            "https://medium.com/@writer/why-rust-1a2b3c4d5e6f"
        );

        assert!(canonical_article_url(&url("https://medium.com/@writer")).is_none());
    }

    #[test]
    fn test_host_key() {
        assert_eq!(host_key(&url("https://Medium.com/@writer")), "medium.com");
        assert_eq!(host_key(&url("http://127.0.0.1:8080/x")), "127.0.0.1:8080");
    }
}
