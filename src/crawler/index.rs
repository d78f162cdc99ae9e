//! Author index resolution
//!
//! Walks an author's paginated archive and collects the canonical URLs of
//! every article, in discovery order.

use crate::crawler::cursor::Cursor;
use crate::crawler::fetcher::Fetcher;
use crate::extract::{parse_listing, NextPage};
use crate::{FetchError, FetchErrorKind, ResolveError};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Outcome of walking an author's archive
#[derive(Debug, Clone, Default)]
pub struct IndexResolution {
    /// Canonical article URLs in discovery order, without duplicates
    pub urls: Vec<Url>,

    /// True if pagination stopped before the archive was exhausted
    pub partial: bool,

    pub pages_fetched: u32,

    /// The fetch failure that cut pagination short, if any
    pub error: Option<FetchError>,
}

/// Resolves an author URL into the list of their article URLs
pub struct AuthorIndexResolver {
    fetcher: Arc<Fetcher>,
    max_pages: u32,
}

impl AuthorIndexResolver {
    pub fn new(fetcher: Arc<Fetcher>, max_pages: u32) -> Self {
        Self {
            fetcher,
            max_pages: max_pages.max(1),
        }
    }

    /// Walks the author's archive page by page
    ///
    /// # Termination
    ///
    /// Checked after every page, in this order:
    /// 1. The platform reports no further pages
    /// 2. The page yielded zero new URLs
    /// 3. `max_articles` URLs have been collected
    ///
    /// A cursor that was already requested also ends the walk, and
    /// `max_pages` bounds it (reported as partial).
    ///
    /// # Arguments
    ///
    /// * `author_url` - The author's archive (first page)
    /// * `max_articles` - Upper bound on returned URLs
    /// * `cancel` - Stops the walk before the next page
    ///
    /// # Returns
    ///
    /// * `Ok(IndexResolution)` - At least one URL, or a cancelled walk
    /// * `Err(ResolveError)` - The first page failed or listed no articles
    pub async fn resolve_article_urls(
        &self,
        author_url: &Url,
        max_articles: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<IndexResolution, ResolveError> {
        let mut resolution = IndexResolution::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut requested: HashSet<String> = HashSet::new();
        let mut cursor = Some(Cursor::start(author_url.clone()));
        let mut speculative = false;

        while let Some(current) = cursor.take() {
            if cancel.is_cancelled() {
                tracing::info!(
                    "Index resolution cancelled after {} page(s)",
                    resolution.pages_fetched
                );
                resolution.partial = true;
                break;
            }

            if resolution.pages_fetched >= self.max_pages {
                tracing::warn!("Stopping index resolution at page limit {}", self.max_pages);
                resolution.partial = true;
                break;
            }

            if !requested.insert(current.url.to_string()) {
                tracing::debug!("Listing cursor {} was already requested", current.url);
                break;
            }

            let body = match self.fetcher.fetch(&current.url).await {
                Ok(body) => body,
                Err(error) if resolution.urls.is_empty() => {
                    return Err(ResolveError::from_fetch(error));
                }
                Err(error) if speculative && is_missing_page(&error) => {
                    // A guessed page number past the end of the archive
                    tracing::debug!("No listing page at {}: {}", current.url, error);
                    break;
                }
                Err(error) => {
                    tracing::warn!(
                        "Listing page {} failed, keeping {} URL(s): {}",
                        current.page,
                        resolution.urls.len(),
                        error
                    );
                    resolution.partial = true;
                    resolution.error = Some(error);
                    break;
                }
            };
            resolution.pages_fetched += 1;

            let page = parse_listing(&body, &current.url);
            let mut new_urls = 0;
            for url in page.article_urls {
                if seen.insert(url.as_str().to_string()) {
                    resolution.urls.push(url);
                    new_urls += 1;
                }
            }

            tracing::debug!(
                "Listing page {} ({}): {} new URL(s), next: {:?}",
                current.page,
                current.url,
                new_urls,
                page.next
            );

            if page.next.is_end() || new_urls == 0 {
                break;
            }
            if max_articles.is_some_and(|max| resolution.urls.len() >= max) {
                break;
            }

            speculative = page.next == NextPage::Unknown;
            cursor = current.advance(&page.next, author_url);
        }

        if let Some(max) = max_articles {
            resolution.urls.truncate(max);
        }

        if resolution.urls.is_empty() && !cancel.is_cancelled() {
            return Err(ResolveError::Empty {
                url: author_url.to_string(),
            });
        }

        tracing::info!(
            "Resolved {} article URL(s) from {} page(s){}",
            resolution.urls.len(),
            resolution.pages_fetched,
            if resolution.partial { " (partial)" } else { "" }
        );

        Ok(resolution)
    }
}

/// 4xx answers other than 429 mean the guessed page does not exist
fn is_missing_page(error: &FetchError) -> bool {
    matches!(error.kind, FetchErrorKind::HttpStatus(code) if (400..500).contains(&code) && code != 429)
}
