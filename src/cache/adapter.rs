//! Proxy-specific view of the bounded store.
//!
//! Keys are namespaced as `cache:<path+query>`. Entries are immutable
//! snapshots of an origin response taken before any header rewriting.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use serde::Serialize;

use crate::cache::store::BoundedStore;
use crate::config::{CacheConfig, CacheStrategy};
use crate::observability::metrics;

const KEY_PREFIX: &str = "cache:";

/// One cached origin response.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub body: Bytes,
    pub content_type: Option<String>,
    pub status: StatusCode,
    pub status_text: String,
    /// Origin headers as received, before any transformation.
    pub headers: HeaderMap,
    /// Capture time, diagnostics only. Expiry belongs to the store.
    pub cached_at: SystemTime,
}

/// Body of `/cache/info`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub size: usize,
    pub max: usize,
    pub ttl: u64,
    pub calculated_size: usize,
    pub strategy: CacheStrategy,
    pub static_only: bool,
}

/// Body of `/cache/stats`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total: usize,
    pub strategy: CacheStrategy,
    pub static_only: bool,
    pub entries: Vec<CacheStatsEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsEntry {
    pub key: String,
    pub content_type: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub cached_at: u64,
    pub size: usize,
}

/// Wraps [`BoundedStore`] with key formatting, size ceiling and reporting.
pub struct CacheStoreAdapter {
    store: BoundedStore<Arc<CacheEntry>>,
    strategy: CacheStrategy,
    static_only: bool,
    ttl: Duration,
    max_entry_bytes: usize,
    stats_page_size: usize,
}

impl CacheStoreAdapter {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            store: BoundedStore::new(config.max_entries),
            strategy: config.strategy,
            static_only: config.static_only,
            ttl: config.ttl(),
            max_entry_bytes: config.max_entry_bytes,
            stats_page_size: config.stats_page_size,
        }
    }

    /// `cache:<url>` where `url` is path plus query.
    pub fn cache_key(url: &str) -> String {
        format!("{}{}", KEY_PREFIX, url)
    }

    pub fn enabled(&self) -> bool {
        self.strategy != CacheStrategy::Off
    }

    /// Look up a previously stored response. Always a miss when disabled.
    pub fn lookup(&self, url: &str) -> Option<Arc<CacheEntry>> {
        if !self.enabled() {
            return None;
        }
        self.store.get(&Self::cache_key(url))
    }

    /// Store a response. Returns false when disabled or the body exceeds the ceiling.
    pub fn store(
        &self,
        url: &str,
        status: StatusCode,
        status_text: &str,
        headers: &HeaderMap,
        content_type: Option<&str>,
        body: Bytes,
    ) -> bool {
        if !self.enabled() {
            return false;
        }
        if body.len() > self.max_entry_bytes {
            tracing::debug!(
                url = %url,
                size = body.len(),
                limit = self.max_entry_bytes,
                "Response too large to cache"
            );
            return false;
        }

        let key = Self::cache_key(url);
        let size = body.len();
        let entry = CacheEntry {
            key: key.clone(),
            body,
            content_type: content_type.map(str::to_string),
            status,
            status_text: status_text.to_string(),
            headers: headers.clone(),
            cached_at: SystemTime::now(),
        };
        self.store.set(key, Arc::new(entry), size, self.ttl);
        metrics::record_cache_size(self.store.len());
        true
    }

    pub fn clear(&self) {
        self.store.clear();
        metrics::record_cache_size(0);
    }

    pub fn info(&self) -> CacheInfo {
        CacheInfo {
            size: self.store.len(),
            max: self.store.capacity(),
            ttl: self.ttl.as_secs(),
            calculated_size: self.store.calculated_size(),
            strategy: self.strategy,
            static_only: self.static_only,
        }
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.store.entries();
        CacheStats {
            total: entries.len(),
            strategy: self.strategy,
            static_only: self.static_only,
            entries: entries
                .into_iter()
                .take(self.stats_page_size)
                .map(|(key, entry)| CacheStatsEntry {
                    key: display_key(&key),
                    content_type: entry.content_type.clone(),
                    cached_at: entry
                        .cached_at
                        .duration_since(UNIX_EPOCH)
                        .unwrap_or_default()
                        .as_millis() as u64,
                    size: entry.body.len(),
                })
                .collect(),
        }
    }
}

/// Strip the namespace and any `token` query parameter from a key.
fn display_key(key: &str) -> String {
    let url = key.strip_prefix(KEY_PREFIX).unwrap_or(key);
    let Some((path, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && pair.split('=').next() != Some("token"))
        .collect();
    if kept.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, kept.join("&"))
    }
}
