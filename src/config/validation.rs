use crate::config::types::{Config, CrawlerConfig, ServerConfig, SessionConfig, UserAgentConfig};
use crate::ConfigError;
use scraper::Selector;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_session_config(&config.session)?;
    validate_crawler_config(&config.crawler)?;
    Ok(())
}

/// Validates the server origin
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.host.is_empty() {
        return Err(ConfigError::Validation("host cannot be empty".to_string()));
    }

    if !config
        .host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "host must be a bare host name or IPv4 address, got '{}'",
            config.host
        )));
    }

    if config.port == 0 {
        return Err(ConfigError::Validation("port must be non-zero".to_string()));
    }

    // Anything smaller cannot hold the stray CRLF reads the assembler skips.
    if config.read_block_size < 16 {
        return Err(ConfigError::Validation(format!(
            "read_block_size must be >= 16 bytes, got {}",
            config.read_block_size
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

    if config.crawler_version.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "crawler_version cannot contain whitespace, got '{}'",
            config.crawler_version
        )));
    }

    Ok(())
}

/// Validates session endpoints and field names
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    validate_path("login_path", &config.login_path)?;
    validate_path("logout_path", &config.logout_path)?;
    validate_path("probe_path", &config.probe_path)?;
    validate_token_name("csrf_field", &config.csrf_field)?;
    validate_token_name("csrf_cookie", &config.csrf_cookie)?;
    Ok(())
}

/// Validates crawl parameters
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_path("start_path", &config.start_path)?;

    if config.target_flags < 1 {
        return Err(ConfigError::Validation(format!(
            "target_flags must be >= 1, got {}",
            config.target_flags
        )));
    }

    Selector::parse(&config.flag_selector)
        .map_err(|_| ConfigError::InvalidSelector(config.flag_selector.clone()))?;

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.retry_backoff_ms > config.max_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "retry_backoff_ms ({}) cannot exceed max_backoff_ms ({})",
            config.retry_backoff_ms, config.max_backoff_ms
        )));
    }

    Ok(())
}

/// Validates an origin-relative request path
fn validate_path(name: &str, path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{} must start with '/', got '{}'",
            name, path
        )));
    }

    if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "{} cannot contain whitespace, got '{}'",
            name, path
        )));
    }

    Ok(())
}

/// Validates a form field or cookie name
fn validate_token_name(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "{} must contain only ASCII letters, digits, '-' or '_', got '{}'",
            name, value
        )));
    }

    Ok(())
}
