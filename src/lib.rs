//! Byline: an author archive scraper
//!
//! This crate discovers every article an author has published on a
//! Medium-style platform, extracts each article (and optionally its
//! responses), and hands the results to a filtering/export stage.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod model;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Byline operations
#[derive(Debug, Error)]
pub enum BylineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to resolve author index: {0}")]
    Resolve(#[from] ResolveError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunState,
        to: state::RunState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single fetch ultimately failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchErrorKind {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("network error: {0}")]
    Network(String),
}

impl FetchErrorKind {
    /// Timeouts, network errors, 5xx and 429 are worth another attempt
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Network(_) => true,
            Self::HttpStatus(code) => *code == 429 || (500..600).contains(code),
        }
    }
}

/// A fetch that failed after exhausting its attempts (or a non-retryable one)
#[derive(Debug, Clone, Error)]
#[error("fetching {url} failed after {attempts} attempt(s): {kind}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
    pub attempts: u32,
}

impl FetchError {
    /// Returns the HTTP status code, if the failure was an HTTP status
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            FetchErrorKind::HttpStatus(code) => Some(code),
            _ => None,
        }
    }
}

/// Errors that make the author index unavailable
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("{0}")]
    ExhaustedRetries(FetchError),

    #[error("author page requires authorization: {url}")]
    Unauthorized { url: String },

    #[error("author page not found: {url}")]
    NotFound { url: String },

    #[error("no articles found on author page {url}")]
    Empty { url: String },
}

impl ResolveError {
    /// Classifies a first-page fetch failure
    pub fn from_fetch(error: FetchError) -> Self {
        match error.status() {
            Some(401) | Some(403) => Self::Unauthorized { url: error.url },
            Some(404) | Some(410) => Self::NotFound { url: error.url },
            _ => Self::ExhaustedRetries(error),
        }
    }
}

/// Soft, per-article extraction failures
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no title could be recovered from {url}")]
    MissingTitle { url: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Byline operations
pub type Result<T> = std::result::Result<T, BylineError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_scrape, Coordinator, ScrapeResult};
pub use model::{ArticleRecord, CommentRecord};
pub use state::RunState;
