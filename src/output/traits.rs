//! Output traits and types
//!
//! This module defines the progress sink interface the coordinator reports
//! to, and the error type of the export stage.

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Progress of a scrape run, in the order events happen
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeEvent {
    Started {
        author_url: String,
    },

    IndexResolved {
        count: usize,
        partial: bool,
    },

    ArticleExtracted {
        url: String,
        /// Discovery position of the article
        position: usize,
        comments: usize,
    },

    ArticleFailed {
        url: String,
        reason: String,
    },

    Completed {
        extracted: usize,
        failed: usize,
        partial: bool,
        cancelled: bool,
    },

    Failed {
        reason: String,
    },
}

/// Receives progress events from a running scrape
///
/// Implementations must be thread-safe: events arrive from worker tasks.
pub trait ProgressSink: Send + Sync {
    /// Records one event
    ///
    /// # Arguments
    ///
    /// * `event` - What just happened
    fn on_event(&self, event: &ScrapeEvent);
}

/// Default sink: one structured `tracing` event per scrape event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn on_event(&self, event: &ScrapeEvent) {
        match event {
            ScrapeEvent::Started { author_url } => {
                tracing::info!(author_url = %author_url, "Scrape started");
            }
            ScrapeEvent::IndexResolved { count, partial } => {
                tracing::info!(count, partial, "Author index resolved");
            }
            ScrapeEvent::ArticleExtracted {
                url,
                position,
                comments,
            } => {
                tracing::info!(url = %url, position, comments, "Article extracted");
            }
            ScrapeEvent::ArticleFailed { url, reason } => {
                tracing::warn!(url = %url, reason = %reason, "Article failed");
            }
            ScrapeEvent::Completed {
                extracted,
                failed,
                partial,
                cancelled,
            } => {
                tracing::info!(extracted, failed, partial, cancelled, "Scrape completed");
            }
            ScrapeEvent::Failed { reason } => {
                tracing::error!(reason = %reason, "Scrape failed");
            }
        }
    }
}
