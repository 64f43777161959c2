//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve configuration: TOML file when given, environment otherwise
//! - Bind the listener last, once everything else is ready

use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError, ProxyConfig};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Load from `path` (with environment overrides) or from the environment alone.
pub fn resolve_config(path: Option<&Path>) -> Result<ProxyConfig, StartupError> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => ProxyConfig::from_env()?,
    };
    Ok(config)
}

pub async fn bind_listener(config: &ProxyConfig) -> Result<TcpListener, StartupError> {
    let address = config.listener.bind_address.clone();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}
