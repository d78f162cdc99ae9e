//! Comment (response) collection for one article

use crate::crawler::cursor::Cursor;
use crate::crawler::fetcher::{Accept, FetchOptions, Fetcher};
use crate::extract::parse_comment_page;
use crate::model::CommentRecord;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Collects every comment of an article across response pages
///
/// Never fails: a fetch error ends collection with what was parsed so far.
#[derive(Debug, Clone)]
pub struct CommentExtractor {
    fetcher: Arc<Fetcher>,

    /// Origin the `/p/<id>/responses` listing is served from
    base: Url,

    max_pages: u32,
}

impl CommentExtractor {
    pub fn new(fetcher: Arc<Fetcher>, base: Url, max_pages: u32) -> Self {
        Self {
            fetcher,
            base,
            max_pages: max_pages.max(1),
        }
    }

    /// URL of the first response page for an article
    pub fn responses_url(&self, article_id: &str) -> Option<Url> {
        self.base.join(&format!("/p/{}/responses", article_id)).ok()
    }

    /// Collects the article's comments
    ///
    /// Pagination stops on an end marker, a page with no new comments, or
    /// the page limit. Parent references to comments that were not collected
    /// (and self references) are cleared.
    pub async fn extract_comments(&self, article_id: &str) -> Vec<CommentRecord> {
        let Some(origin) = self.responses_url(article_id) else {
            tracing::warn!("Cannot build a responses URL for article {}", article_id);
            return Vec::new();
        };

        let options = FetchOptions {
            accept: Accept::Json,
            max_attempts: None,
        };

        let mut comments: Vec<CommentRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut requested: HashSet<String> = HashSet::new();
        let mut cursor = Some(Cursor::start(origin.clone()));

        while let Some(current) = cursor.take() {
            if current.page > self.max_pages {
                tracing::debug!("Comment page limit reached for {}", article_id);
                break;
            }
            if !requested.insert(current.url.to_string()) {
                break;
            }

            let body = match self.fetcher.fetch_with(&current.url, &options).await {
                Ok(body) => body,
                Err(error) => {
                    tracing::warn!(
                        "Comments for {} stopped at page {} ({} collected): {}",
                        article_id,
                        current.page,
                        comments.len(),
                        error
                    );
                    break;
                }
            };

            let page = parse_comment_page(&body, &current.url);
            let mut new_comments = 0;
            for comment in page.comments {
                if seen.insert(comment.id.clone()) {
                    comments.push(comment);
                    new_comments += 1;
                }
            }

            if page.next.is_end() || new_comments == 0 {
                break;
            }
            cursor = current.advance(&page.next, &origin);
        }

        clear_dangling_parents(&mut comments);
        tracing::debug!("Collected {} comment(s) for {}", comments.len(), article_id);
        comments
    }
}

/// Nulls parent references that point outside the collected set or at self
pub fn clear_dangling_parents(comments: &mut [CommentRecord]) {
    let ids: HashSet<String> = comments.iter().map(|c| c.id.clone()).collect();

    for comment in comments.iter_mut() {
        let dangling = comment
            .parent_id
            .as_ref()
            .is_some_and(|parent| parent == &comment.id || !ids.contains(parent));
        if dangling {
            comment.parent_id = None;
        }
    }
}
