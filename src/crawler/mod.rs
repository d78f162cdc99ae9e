//! Crawler module for fetching and processing an author's archive
//!
//! This module contains the networked side of a scrape, including:
//! - HTTP fetching with retry logic and backoff
//! - Per-host rate limiting
//! - Author index pagination
//! - Article and comment extraction
//! - Overall run coordination

mod article;
mod comments;
mod coordinator;
mod cursor;
mod fetcher;
mod index;
mod rate_limit;
mod retry;

pub use article::ArticleExtractor;
pub use comments::{clear_dangling_parents, CommentExtractor};
pub use coordinator::{run_scrape, ArticleFailure, Coordinator, ScrapeOptions, ScrapeResult};
pub use cursor::Cursor;
pub use fetcher::{build_http_client, Accept, FetchOptions, Fetcher};
pub use index::{AuthorIndexResolver, IndexResolution};
pub use rate_limit::{HostState, RateLimiter};
pub use retry::RetryPolicy;
