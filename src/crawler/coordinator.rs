//! Scrape coordinator - main orchestration logic
//!
//! This module drives one scrape run through its state machine:
//! - Resolving the author index
//! - Extracting articles (and optionally comments) on a bounded worker pool
//! - Collecting results in discovery order
//! - Handling cancellation and per-article failures

use crate::config::Config;
use crate::crawler::article::ArticleExtractor;
use crate::crawler::comments::CommentExtractor;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::index::AuthorIndexResolver;
use crate::model::ArticleRecord;
use crate::output::{ProgressSink, ScrapeEvent, TracingSink};
use crate::state::RunState;
use crate::url::normalize_url;
use crate::{BylineError, ExtractError};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Knobs of one scrape run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub max_articles: Option<usize>,
    pub include_comments: bool,
    pub max_concurrent_articles: usize,
    pub max_index_pages: u32,
    pub max_comment_pages: u32,
}

impl ScrapeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_articles: config.input.max_articles,
            include_comments: config.input.include_comments,
            max_concurrent_articles: config.scraper.max_concurrent_articles.max(1),
            max_index_pages: config.scraper.max_index_pages,
            max_comment_pages: config.scraper.max_comment_pages,
        }
    }
}

/// An article that could not be extracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of a scrape run that got past index resolution
#[derive(Debug, Clone, Default)]
pub struct ScrapeResult {
    /// Extracted articles in discovery order
    pub articles: Vec<ArticleRecord>,

    pub resolved_count: usize,
    pub extracted_count: usize,
    pub failed_count: usize,

    /// True if any data is missing: truncated index, failed articles, or cancellation
    pub partial: bool,

    pub cancelled: bool,

    /// Failed articles in discovery order
    pub failures: Vec<ArticleFailure>,
}

impl ScrapeResult {
    pub fn total_comments(&self) -> usize {
        self.articles.iter().map(ArticleRecord::comment_count).sum()
    }
}

/// Main scrape coordinator structure
pub struct Coordinator {
    options: ScrapeOptions,
    fetcher: Arc<Fetcher>,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
    state: RunState,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The scraper configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(BylineError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, BylineError> {
        let fetcher = Fetcher::from_config(config)?;

        Ok(Self {
            options: ScrapeOptions::from_config(config),
            fetcher: Arc::new(fetcher),
            sink: Arc::new(TracingSink),
            cancel: CancellationToken::new(),
            state: RunState::Idle,
        })
    }

    /// Replaces the fetcher (and with it the rate limiter)
    pub fn with_fetcher(mut self, fetcher: Arc<Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn transition(&mut self, next: RunState) -> Result<(), BylineError> {
        if !self.state.can_transition_to(next) {
            return Err(BylineError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("Run state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs one scrape
    ///
    /// This is the core logic that:
    /// 1. Resolves the author's article URLs
    /// 2. Extracts every article on a bounded worker pool
    /// 3. Attaches comments when enabled
    /// 4. Returns the articles in discovery order
    ///
    /// A coordinator runs once; a second call fails with
    /// [`BylineError::InvalidTransition`].
    ///
    /// # Returns
    ///
    /// * `Ok(ScrapeResult)` - The run completed, possibly with partial data
    /// * `Err(BylineError)` - The author index could not be resolved
    pub async fn run(&mut self, author_url: &Url) -> Result<ScrapeResult, BylineError> {
        let author_url = normalize_url(author_url.as_str())?;
        self.transition(RunState::ResolvingIndex)?;
        self.sink.on_event(&ScrapeEvent::Started {
            author_url: author_url.to_string(),
        });

        let resolver =
            AuthorIndexResolver::new(Arc::clone(&self.fetcher), self.options.max_index_pages);
        let resolution = match resolver
            .resolve_article_urls(&author_url, self.options.max_articles, &self.cancel)
            .await
        {
            Ok(resolution) => resolution,
            Err(error) => {
                self.transition(RunState::Failed)?;
                self.sink.on_event(&ScrapeEvent::Failed {
                    reason: error.to_string(),
                });
                return Err(error.into());
            }
        };

        self.sink.on_event(&ScrapeEvent::IndexResolved {
            count: resolution.urls.len(),
            partial: resolution.partial,
        });

        self.transition(RunState::ExtractingArticles)?;
        let extraction = self.extract_all(&resolution.urls).await;
        self.transition(RunState::Done)?;

        let cancelled =
            self.cancel.is_cancelled() && (extraction.skipped > 0 || resolution.partial);
        let articles: Vec<ArticleRecord> = extraction.slots.into_iter().flatten().collect();
        let failed_count = extraction.failures.len();

        let result = ScrapeResult {
            resolved_count: resolution.urls.len(),
            extracted_count: articles.len(),
            failed_count,
            partial: resolution.partial || cancelled || failed_count > 0,
            cancelled,
            failures: extraction.failures,
            articles,
        };

        self.sink.on_event(&ScrapeEvent::Completed {
            extracted: result.extracted_count,
            failed: result.failed_count,
            partial: result.partial,
            cancelled: result.cancelled,
        });

        Ok(result)
    }

    /// Extracts articles concurrently, keeping discovery order
    async fn extract_all(&self, urls: &[Url]) -> Extraction {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_articles));
        let extractor = ArticleExtractor::new(Arc::clone(&self.fetcher));
        let mut handles: Vec<(usize, Url, JoinHandle<Result<ArticleRecord, ExtractError>>)> =
            Vec::with_capacity(urls.len());

        for (position, url) in urls.iter().enumerate() {
            // No new articles start once cancelled; in-flight ones finish
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let extractor = extractor.clone();
            let comments = self
                .options
                .include_comments
                .then(|| (Arc::clone(&self.fetcher), self.options.max_comment_pages));
            let task_url = url.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                extract_one(&extractor, &task_url, comments).await
            });

            handles.push((position, url.clone(), handle));
        }

        let skipped = urls.len() - handles.len();
        if skipped > 0 {
            tracing::info!("Cancelled: {} article(s) not started", skipped);
        }

        let mut slots: Vec<Option<ArticleRecord>> = vec![None; urls.len()];
        let mut failures = Vec::new();

        for (position, url, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome.map_err(|e| e.to_string()),
                Err(e) => {
                    tracing::error!("Task join error for {}: {}", url, e);
                    Err(format!("extraction task failed: {}", e))
                }
            };

            match outcome {
                Ok(article) => {
                    self.sink.on_event(&ScrapeEvent::ArticleExtracted {
                        url: article.url.clone(),
                        position,
                        comments: article.comment_count(),
                    });
                    slots[position] = Some(article);
                }
                Err(reason) => {
                    self.sink.on_event(&ScrapeEvent::ArticleFailed {
                        url: url.to_string(),
                        reason: reason.clone(),
                    });
                    failures.push(ArticleFailure {
                        url: url.to_string(),
                        reason,
                    });
                }
            }
        }

        Extraction {
            slots,
            failures,
            skipped,
        }
    }
}

/// Extracts one article and, when asked, its comments
async fn extract_one(
    extractor: &ArticleExtractor,
    url: &Url,
    comments: Option<(Arc<Fetcher>, u32)>,
) -> Result<ArticleRecord, ExtractError> {
    let article = extractor.extract(url).await?;

    let (Some((fetcher, max_pages)), Some(id)) = (comments, article.id.clone()) else {
        return Ok(article);
    };

    // Responses are served from the article's own origin
    let base = Url::parse(&article.url).unwrap_or_else(|_| url.clone());
    let comments = CommentExtractor::new(fetcher, base, max_pages)
        .extract_comments(&id)
        .await;
    Ok(article.with_comments(comments))
}

/// Results of the extraction phase, indexed by discovery position
struct Extraction {
    slots: Vec<Option<ArticleRecord>>,
    failures: Vec<ArticleFailure>,
    skipped: usize,
}

/// Runs a complete scrape for the configured author
///
/// This is the main entry point for the library. Ctrl-C handling and
/// exporting are left to the caller.
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `cancel` - Token that stops the run early
///
/// # Returns
///
/// * `Ok(ScrapeResult)` - Scrape completed, possibly partial
/// * `Err(BylineError)` - Index resolution failed
pub async fn run_scrape(
    config: &Config,
    cancel: CancellationToken,
) -> Result<ScrapeResult, BylineError> {
    let author_url = Url::parse(&config.input.author_url)?;
    let mut coordinator = Coordinator::new(config)?.with_cancellation(cancel);
    coordinator.run(&author_url).await
}
