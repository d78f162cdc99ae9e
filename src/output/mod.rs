//! Output module for the post-scrape stage
//!
//! This module handles:
//! - Progress reporting while a scrape runs
//! - Tag filtering of the extracted articles
//! - Exporting articles as JSON, CSV or a Markdown digest
//! - Computing and printing run statistics

mod export;
mod filter;
mod markdown;
pub mod stats;
mod traits;

pub use export::export_articles;
pub use filter::filter_by_tags;
pub use markdown::format_markdown_digest;
pub use stats::{print_run_history, print_statistics, ScrapeStats};
pub use traits::{OutputError, OutputResult, ProgressSink, ScrapeEvent, TracingSink};

use crate::model::ArticleRecord;
use serde::{Deserialize, Serialize};

/// Payload stored per run in the dataset store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPayload {
    pub articles: Vec<ArticleRecord>,
    pub stats: ScrapeStats,
}
