use crate::config::types::{Config, CrawlOptions, FetchConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Largest accepted pause between requests, in milliseconds
pub const MAX_DELAY_MS: u64 = 5_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_options(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates crawl options
fn validate_crawl_options(options: &CrawlOptions) -> Result<(), ConfigError> {
    if options.max_depth < 1 || options.max_depth > 10 {
        return Err(ConfigError::Validation(format!(
            "max_depth must be between 1 and 10, got {}",
            options.max_depth
        )));
    }

    if options.max_pages < 1 || options.max_pages > 10_000 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and 10000, got {}",
            options.max_pages
        )));
    }

    if options.delay > MAX_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "delay must be <= {}ms, got {}ms",
            MAX_DELAY_MS, options.delay
        )));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 120, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    // The name doubles as the robots.txt product token
    if config.crawler_name.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "crawler_name cannot contain whitespace, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}
