//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{CacheStrategy, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, then overlay the environment.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: ProxyConfig = toml::from_str(&content)?;

    config.apply_env(|var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

impl ProxyConfig {
    /// Build from defaults plus process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = ProxyConfig::default();
        config.apply_env(|var| std::env::var(var).ok())?;
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Overlay environment-style variables. `lookup` returns `None` for unset vars.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TARGET_PROTOCOL") {
            self.origin.protocol = v.trim().trim_end_matches(':').to_ascii_lowercase();
        }
        if let Some(v) = lookup("TARGET_HOST") {
            self.origin.host = v.trim().to_string();
        }
        if let Some(port) = parse_var::<u16, _>(&lookup, "PORT")? {
            self.listener.bind_address = format!("0.0.0.0:{}", port);
        }
        if let Some(ttl) = parse_var(&lookup, "CACHE_TTL")? {
            self.cache.ttl_secs = ttl;
        }
        if let Some(max) = parse_var(&lookup, "CACHE_MAX_ENTRIES")? {
            self.cache.max_entries = max;
        }
        if let Some(token) = lookup("CACHE_CLEAR_TOKEN") {
            let token = token.trim().to_string();
            self.cache.clear_token = (!token.is_empty()).then_some(token);
        }
        if let Some(ms) = parse_var(&lookup, "REQUEST_TIMEOUT")? {
            self.upstream.request_timeout_ms = ms;
        }
        if let Some(max) = parse_var(&lookup, "MAX_CONNECTIONS")? {
            self.upstream.max_connections = max;
        }
        if let Some(ms) = parse_var(&lookup, "KEEP_ALIVE_TIMEOUT")? {
            self.upstream.keep_alive_timeout_ms = ms;
        }
        if let Some(strategy) = parse_var::<CacheStrategy, _>(&lookup, "CACHE_STRATEGY")? {
            self.cache.strategy = strategy;
        }
        if let Some(v) = lookup("CACHE_STATIC_ONLY") {
            self.cache.static_only = parse_bool(&v).ok_or(ConfigError::Env {
                var: "CACHE_STATIC_ONLY",
                value: v,
            })?;
        }
        if let Some(v) = lookup("INJECT_HEAD_START") {
            self.inject.head_start = v;
        }
        if let Some(v) = lookup("INJECT_HEAD_END") {
            self.inject.head_end = v;
        }
        if let Some(v) = lookup("INJECT_BODY_START") {
            self.inject.body_start = v;
        }
        if let Some(v) = lookup("INJECT_BODY_END") {
            self.inject.body_end = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.observability.log_level = v;
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
