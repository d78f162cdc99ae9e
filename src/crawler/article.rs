//! Fetch-and-parse of a single article

use crate::crawler::fetcher::Fetcher;
use crate::extract::parse_article;
use crate::model::ArticleRecord;
use crate::ExtractError;
use std::sync::Arc;
use url::Url;

/// Turns an article URL into an [`ArticleRecord`]
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    fetcher: Arc<Fetcher>,
}

impl ArticleExtractor {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetches and parses one article
    ///
    /// # Returns
    ///
    /// * `Ok(ArticleRecord)` - The article, without comments
    /// * `Err(ExtractError)` - The page could not be fetched or had no title
    pub async fn extract(&self, url: &Url) -> Result<ArticleRecord, ExtractError> {
        let html = self.fetcher.fetch(url).await?;

        let article = parse_article(url, &html).ok_or_else(|| ExtractError::MissingTitle {
            url: url.to_string(),
        })?;

        tracing::debug!(
            "Extracted \"{}\" ({} tag(s), {} claps)",
            article.title,
            article.tags.len(),
            article.claps
        );
        Ok(article)
    }
}
