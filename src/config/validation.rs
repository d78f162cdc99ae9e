use crate::config::types::{Config, InputConfig, OutputConfig, ScraperConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_input_config(&config.input)?;
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates what is being scraped
fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.author_url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "author_url is required".to_string(),
        ));
    }

    let url = Url::parse(&config.author_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid author_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "author_url '{}' must use HTTP or HTTPS",
            config.author_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "author_url '{}' has no host",
            config.author_url
        )));
    }

    if config.max_articles == Some(0) {
        return Err(ConfigError::Validation(
            "max_articles must be >= 1 when set".to_string(),
        ));
    }

    if config.tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "tags cannot contain blank entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates scraper limits
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_articles < 1 || config.max_concurrent_articles > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_articles must be between 1 and 64, got {}",
            config.max_concurrent_articles
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_base < 1 {
        return Err(ConfigError::Validation(
            "backoff_base must be >= 1ms".to_string(),
        ));
    }

    if config.backoff_base > config.backoff_max {
        return Err(ConfigError::Validation(format!(
            "backoff_base ({}ms) cannot exceed backoff_max ({}ms)",
            config.backoff_base, config.backoff_max
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request_timeout must be >= 1s".to_string(),
        ));
    }

    if config.max_index_pages < 1 || config.max_comment_pages < 1 {
        return Err(ConfigError::Validation(
            "page limits must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.dataset_path.is_empty() {
        return Err(ConfigError::Validation(
            "dataset_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
