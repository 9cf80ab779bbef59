use crate::config::types::{Config, FetchConfig, LimitsConfig, ServerConfig};
use crate::ConfigError;
use std::net::SocketAddr;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_limits_config(&config.limits)?;
    validate_fetch_config(&config.fetch)?;
    Ok(())
}

/// Validates server configuration
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.listen_addr.parse::<SocketAddr>().map_err(|e| {
        ConfigError::InvalidAddr(format!("'{}': {}", config.listen_addr, e))
    })?;

    if config.max_connections < 1 || config.max_connections > 10_000 {
        return Err(ConfigError::Validation(format!(
            "max_connections must be between 1 and 10000, got {}",
            config.max_connections
        )));
    }

    if config.shutdown_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "shutdown_timeout_ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates per-request limits
fn validate_limits_config(config: &LimitsConfig) -> Result<(), ConfigError> {
    if config.max_urls < 1 || config.max_urls > 1000 {
        return Err(ConfigError::Validation(format!(
            "max_urls must be between 1 and 1000, got {}",
            config.max_urls
        )));
    }

    if config.max_concurrent_sub_requests < 1 || config.max_concurrent_sub_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_sub_requests must be between 1 and 100, got {}",
            config.max_concurrent_sub_requests
        )));
    }

    Ok(())
}

/// Validates outbound fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= 10ms, got {}ms",
            config.timeout_ms
        )));
    }

    Ok(())
}
