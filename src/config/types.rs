use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Main configuration structure for Byline
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub input: InputConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Builds a configuration with default settings for the given author
    pub fn for_author(author_url: impl Into<String>) -> Self {
        Self {
            input: InputConfig {
                author_url: author_url.into(),
                tags: Vec::new(),
                tag_match: TagMatch::default(),
                output_format: OutputFormat::default(),
                max_articles: None,
                include_comments: false,
            },
            scraper: ScraperConfig::default(),
            user_agent: UserAgentConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// What to scrape and how to present it
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Author page to start from (e.g. `https://medium.com/@someone`)
    #[serde(rename = "author-url")]
    pub author_url: String,

    /// Tags to keep after scraping (empty keeps everything)
    #[serde(default)]
    pub tags: Vec<String>,

    /// Whether an article must carry any or all of `tags`
    #[serde(rename = "tag-match", default)]
    pub tag_match: TagMatch,

    #[serde(rename = "output-format", default)]
    pub output_format: OutputFormat,

    /// Upper bound on the number of articles resolved from the author index
    #[serde(rename = "max-articles", default)]
    pub max_articles: Option<usize>,

    #[serde(rename = "include-comments", default)]
    pub include_comments: bool,
}

/// Scraper behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Maximum number of articles extracted concurrently
    #[serde(rename = "max-concurrent-articles", default = "default_concurrency")]
    pub max_concurrent_articles: usize,

    /// Minimum time between requests to the same host (milliseconds)
    #[serde(rename = "min-request-interval", default = "default_min_interval")]
    pub min_request_interval: u64,

    /// Total attempts per request, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First retry delay (milliseconds), doubled on every further attempt
    #[serde(rename = "backoff-base", default = "default_backoff_base")]
    pub backoff_base: u64,

    /// Upper bound for a single retry delay (milliseconds)
    #[serde(rename = "backoff-max", default = "default_backoff_max")]
    pub backoff_max: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    #[serde(rename = "max-index-pages", default = "default_max_index_pages")]
    pub max_index_pages: u32,

    #[serde(rename = "max-comment-pages", default = "default_max_comment_pages")]
    pub max_comment_pages: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_concurrent_articles: default_concurrency(),
            min_request_interval: default_min_interval(),
            max_attempts: default_max_attempts(),
            backoff_base: default_backoff_base(),
            backoff_max: default_backoff_max(),
            request_timeout: default_request_timeout(),
            max_index_pages: default_max_index_pages(),
            max_comment_pages: default_max_comment_pages(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

fn default_min_interval() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    4
}

fn default_backoff_base() -> u64 {
    500
}

fn default_backoff_max() -> u64 {
    30_000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_index_pages() -> u32 {
    200
}

fn default_max_comment_pages() -> u32 {
    50
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the scraper
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "byline".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory the export file is written to
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// Path to the SQLite dataset store
    #[serde(rename = "dataset-path", default = "default_dataset_path")]
    pub dataset_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            dataset_path: default_dataset_path(),
        }
    }
}

fn default_output_directory() -> String {
    "./output".to_string()
}

fn default_dataset_path() -> String {
    "./output/dataset.db".to_string()
}

/// Export format for the filtered articles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    /// File extension used for the export file
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Markdown => "md",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Markdown => "markdown",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unsupported output format '{}'", other)),
        }
    }
}

/// How a multi-tag filter is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TagMatch {
    /// Keep an article carrying at least one requested tag
    #[default]
    Any,
    /// Keep an article carrying every requested tag
    All,
}
