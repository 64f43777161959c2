//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, capacity > 0)
//! - Check that the origin is a bare host, not a URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("origin.host must not be empty")]
    EmptyOriginHost,

    #[error("origin.host '{0}' must be a bare host without scheme or path")]
    OriginHostNotBare(String),

    #[error("origin.protocol '{0}' must be http or https")]
    UnsupportedProtocol(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: usize },

    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let host = config.origin.host.trim();
    if host.is_empty() {
        errors.push(ValidationError::EmptyOriginHost);
    } else if host.contains("://") || host.contains('/') {
        errors.push(ValidationError::OriginHostNotBare(host.to_string()));
    }

    if !matches!(config.origin.protocol.as_str(), "http" | "https") {
        errors.push(ValidationError::UnsupportedProtocol(
            config.origin.protocol.clone(),
        ));
    }

    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError::Zero("cache.ttl_secs"));
    }
    if config.cache.max_entries == 0 {
        errors.push(ValidationError::Zero("cache.max_entries"));
    }
    if config.upstream.max_connections == 0 {
        errors.push(ValidationError::Zero("upstream.max_connections"));
    } else if config.upstream.max_connections > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::TooLarge {
            field: "upstream.max_connections",
            max: Semaphore::MAX_PERMITS,
        });
    }
    if config.upstream.request_timeout_ms == 0 {
        errors.push(ValidationError::Zero("upstream.request_timeout_ms"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
