//! Tag filtering of extracted articles

use crate::config::TagMatch;
use crate::extract::article::normalize_tags;
use crate::model::ArticleRecord;

/// Keeps the articles that carry the requested tags
///
/// Requested tags are normalized the same way article tags are (trimmed,
/// lowercased). An empty filter keeps every article. Order is preserved.
///
/// # Arguments
///
/// * `articles` - Articles in discovery order
/// * `tags` - Requested tags
/// * `mode` - Whether any or all requested tags must be present
pub fn filter_by_tags(
    articles: Vec<ArticleRecord>,
    tags: &[String],
    mode: TagMatch,
) -> Vec<ArticleRecord> {
    let wanted = normalize_tags(tags);
    if wanted.is_empty() {
        return articles;
    }

    let before = articles.len();
    let kept: Vec<ArticleRecord> = articles
        .into_iter()
        .filter(|article| match mode {
            TagMatch::Any => wanted.iter().any(|tag| article.has_tag(tag)),
            TagMatch::All => wanted.iter().all(|tag| article.has_tag(tag)),
        })
        .collect();

    tracing::debug!(
        "Tag filter {:?} ({:?}) kept {} of {} article(s)",
        wanted,
        mode,
        kept.len(),
        before
    );
    kept
}
