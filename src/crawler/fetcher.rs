//! HTTP fetcher implementation
//!
//! This module handles every HTTP request of a scrape run:
//! - Building the HTTP client with the configured user agent
//! - Per-host pacing through the shared [`RateLimiter`]
//! - Retrying transient failures with exponential backoff
//! - Classifying the final failure into a [`FetchError`]

use crate::config::{Config, UserAgentConfig};
use crate::crawler::rate_limit::RateLimiter;
use crate::crawler::retry::RetryPolicy;
use crate::url::host_key;
use crate::{FetchError, FetchErrorKind};
use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Which representation a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accept {
    #[default]
    Html,
    Json,
}

impl Accept {
    fn header_value(&self) -> &'static str {
        match self {
            Self::Html => "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            Self::Json => "application/json,text/plain;q=0.9,*/*;q=0.8",
        }
    }
}

/// Per-call fetch options
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub accept: Accept,

    /// Lowers the attempt bound for this call only
    pub max_attempts: Option<u32>,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total timeout applied to each request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use byline::config::UserAgentConfig;
/// use byline::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "byline".to_string(),
///     crawler_version: "0.1.0".to_string(),
///     contact_url: Some("https://example.com/bot".to_string()),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Why one attempt failed
#[derive(Debug)]
struct AttemptFailure {
    kind: FetchErrorKind,
    retry_after: Option<Duration>,
}

impl From<reqwest::Error> for AttemptFailure {
    fn from(error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            FetchErrorKind::Timeout
        } else {
            FetchErrorKind::Network(error.to_string())
        };
        Self {
            kind,
            retry_after: None,
        }
    }
}

/// Rate-limited, retrying page fetcher
///
/// Cloning is cheap; clones share the client and the rate limiter.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, limiter: Arc<RateLimiter>, retry: RetryPolicy) -> Self {
        Self {
            client,
            limiter,
            retry,
        }
    }

    /// Builds a fetcher with its own rate limiter from the configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.scraper.request_timeout),
        )?;
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
            config.scraper.min_request_interval,
        )));
        Ok(Self::new(
            client,
            limiter,
            RetryPolicy::from_config(&config.scraper),
        ))
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetches an HTML page
    pub async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.fetch_with(url, &FetchOptions::default()).await
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Return body |
    /// | 429 | Defer the host, retry |
    /// | 5xx, timeout, network error | Back off, retry |
    /// | Other 4xx | Fail immediately |
    ///
    /// Every attempt first waits for the host's next rate-limit slot.
    pub async fn fetch_with(&self, url: &Url, options: &FetchOptions) -> Result<String, FetchError> {
        let host = host_key(url);
        let max_attempts = options
            .max_attempts
            .map_or(self.retry.max_attempts, |n| n.min(self.retry.max_attempts))
            .max(1);

        let mut attempt = 0;
        let mut previous_delay = Duration::ZERO;

        loop {
            attempt += 1;
            self.limiter.acquire(&host).await;

            let failure = match self.send_once(url, options.accept).await {
                Ok(body) => {
                    tracing::debug!("Fetched {} (attempt {})", url, attempt);
                    return Ok(body);
                }
                Err(failure) => failure,
            };

            if !failure.kind.is_transient() || attempt >= max_attempts {
                tracing::warn!(
                    "Giving up on {} after {} attempt(s): {}",
                    url,
                    attempt,
                    failure.kind
                );
                return Err(FetchError {
                    url: url.to_string(),
                    kind: failure.kind,
                    attempts: attempt,
                });
            }

            let delay = self
                .retry
                .delay_for(attempt, failure.retry_after, previous_delay);
            previous_delay = delay;

            tracing::debug!(
                "Attempt {} for {} failed ({}), retrying in {:?}",
                attempt,
                url,
                failure.kind,
                delay
            );

            if failure.kind == FetchErrorKind::HttpStatus(429) {
                // The next acquire() waits out the deferral
                self.limiter.defer(&host, delay);
            } else {
                tokio::time::sleep(delay).await;
            }
        }
    }

    async fn send_once(&self, url: &Url, accept: Accept) -> Result<String, AttemptFailure> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, accept.header_value())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptFailure {
                kind: FetchErrorKind::HttpStatus(status.as_u16()),
                retry_after: parse_retry_after(response.headers()),
            });
        }

        Ok(response.text().await?)
    }
}

/// Reads a `Retry-After` header given in seconds or as an HTTP date
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let remaining = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
    remaining.to_std().ok()
}
