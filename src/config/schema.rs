//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the mirror.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration for the mirroring proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream this mirror forwards to.
    pub origin: OriginTarget,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Origin connection pool settings.
    pub upstream: UpstreamConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// HTML snippets spliced into mirrored pages.
    pub inject: InjectConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// The origin server being mirrored.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginTarget {
    /// `http` or `https`.
    pub protocol: String,

    /// Host (and optional port) of the origin, e.g. "origin.example".
    pub host: String,
}

impl OriginTarget {
    /// `<protocol>://<host>` with no trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.host)
    }
}

impl Default for OriginTarget {
    fn default() -> Self {
        Self {
            protocol: "https".to_string(),
            host: "example.com".to_string(),
        }
    }
}

/// How the mirror decides whether a response may be cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheStrategy {
    /// Never cache; the store is neither read nor written.
    Off,
    /// Cache every eligible response regardless of origin hints.
    Force,
    /// Honor the origin's `Cache-Control`.
    #[default]
    Auto,
}

impl CacheStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStrategy::Off => "off",
            CacheStrategy::Force => "force",
            CacheStrategy::Auto => "auto",
        }
    }
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(CacheStrategy::Off),
            "force" => Ok(CacheStrategy::Force),
            "auto" => Ok(CacheStrategy::Auto),
            other => Err(format!("unknown cache strategy '{}'", other)),
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// off | force | auto.
    pub strategy: CacheStrategy,

    /// Only cache responses classified as static assets.
    pub static_only: bool,

    /// Entry time-to-live in seconds.
    pub ttl_secs: u64,

    /// Maximum number of cached entries (LRU eviction beyond this).
    pub max_entries: usize,

    /// Token required by `/cache/info` and `/cache/clear`.
    pub clear_token: Option<String>,

    /// Bodies larger than this are never stored.
    pub max_entry_bytes: usize,

    /// Maximum number of entries listed by `/cache/stats`.
    pub stats_page_size: usize,
}

impl CacheConfig {
    pub fn enabled(&self) -> bool {
        self.strategy != CacheStrategy::Off
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            strategy: CacheStrategy::Auto,
            static_only: false,
            ttl_secs: 3600,
            max_entries: 1000,
            clear_token: None,
            max_entry_bytes: 10 * 1024 * 1024, // 10MB
            stats_page_size: 100,
        }
    }
}

/// Origin connection pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Total time allowed for one origin round trip, in milliseconds.
    pub request_timeout_ms: u64,

    /// Maximum idle connections kept open to the origin.
    pub max_connections: usize,

    /// How long an idle pooled connection is kept, in milliseconds.
    pub keep_alive_timeout_ms: u64,
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn keep_alive_timeout(&self) -> Duration {
        Duration::from_millis(self.keep_alive_timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            max_connections: 100,
            keep_alive_timeout_ms: 60_000,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum body size accepted on non-GET requests.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Free-text HTML snippets injected into mirrored pages.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct InjectConfig {
    /// Inserted right after the opening `<head>` tag.
    pub head_start: String,
    /// Inserted right before `</head>`.
    pub head_end: String,
    /// Inserted right after the opening `<body>` tag.
    pub body_start: String,
    /// Inserted right before `</body>`.
    pub body_end: String,
}

impl InjectConfig {
    pub fn is_empty(&self) -> bool {
        self.head_start.is_empty()
            && self.head_end.is_empty()
            && self.body_start.is_empty()
            && self.body_end.is_empty()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
