use crate::config::types::{
    Config, ContentConfig, DiscoveryConfig, HttpConfig, MediaConfig, PipelineConfig,
    TranslationConfig,
};
use crate::ConfigError;
use scraper::Selector;

/// Upper bound on concurrently processed items
const MAX_CONCURRENT_ITEMS: u32 = 32;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_discovery_config(&config.discovery)?;
    validate_content_config(&config.content)?;
    validate_media_config(&config.media)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_translation_config(&config.translation)?;
    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("connect-timeout-secs", config.connect_timeout_secs),
        ("read-timeout-secs", config.read_timeout_secs),
        ("write-timeout-secs", config.write_timeout_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be >= 1", name)));
        }
    }

    Ok(())
}

/// Validates link discovery rules
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    for pattern in &config.allowed_hosts {
        validate_host_pattern(pattern)?;
    }

    if config.deny_substrings.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::Validation(
            "deny-substrings cannot contain an empty entry".to_string(),
        ));
    }

    for selector in &config.nav_selectors {
        validate_selector(selector)?;
    }

    Ok(())
}

/// Validates content rendering rules
fn validate_content_config(config: &ContentConfig) -> Result<(), ConfigError> {
    for selector in config
        .container_selectors
        .iter()
        .chain(config.strip_selectors.iter())
    {
        validate_selector(selector)?;
    }
    Ok(())
}

/// Validates media detection rules
fn validate_media_config(config: &MediaConfig) -> Result<(), ConfigError> {
    if config.extensions.is_empty() {
        return Err(ConfigError::Validation(
            "media extensions cannot be empty".to_string(),
        ));
    }

    for ext in config
        .extensions
        .iter()
        .chain(config.dynamic_extensions.iter())
        .chain(std::iter::once(&config.enforced_extension))
    {
        validate_extension(ext)?;
    }

    if config.directory_fallback.trim().is_empty() {
        return Err(ConfigError::Validation(
            "directory-fallback cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates pipeline settings
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_items < 1 || config.max_concurrent_items > MAX_CONCURRENT_ITEMS {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-items must be between 1 and {}, got {}",
            MAX_CONCURRENT_ITEMS, config.max_concurrent_items
        )));
    }
    Ok(())
}

/// Validates translation pacing
fn validate_translation_config(config: &TranslationConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(
            "translation max-retries must be >= 1".to_string(),
        ));
    }

    if config.max_chunk_chars == 0 {
        return Err(ConfigError::Validation(
            "translation max-chunk-chars must be >= 1".to_string(),
        ));
    }

    for ext in &config.extensions {
        validate_extension(ext)?;
    }

    Ok(())
}

/// Validates a host pattern (supports a leading "*." wildcard)
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    let host = pattern.strip_prefix("*.").unwrap_or(pattern);

    if host.is_empty() {
        return Err(ConfigError::InvalidPattern(format!(
            "Host pattern '{}' has no host",
            pattern
        )));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' has a misplaced dot",
            host
        )));
    }

    Ok(())
}

/// Validates a bare file extension
fn validate_extension(ext: &str) -> Result<(), ConfigError> {
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::Validation(format!(
            "Extension '{}' must be non-empty and alphanumeric (no leading dot)",
            ext
        )));
    }
    Ok(())
}

/// Checks that a CSS selector parses
fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            message: format!("{:?}", e),
        })
}
