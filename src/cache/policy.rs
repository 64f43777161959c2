//! Cache eligibility policy.
//!
//! Evaluated only for `200` responses to `GET` requests on proxied paths.
//!
//! # Decision order
//! 1. `off` → bypass (`disabled`)
//! 2. `static_only` and not a static asset → bypass (`non-static`)
//! 3. `force` → store, origin `Cache-Control` ignored
//! 4. `auto` → store unless the origin sends `no-store`, `no-cache`,
//!    or `private` (the latter only when `static_only` is off)
//!
//! With `static_only` on, `private` static assets are still stored under
//! `auto`. The asset filter is trusted over the origin's audience hint.

use crate::cache::classifier::is_static;
use crate::config::{CacheConfig, CacheStrategy};

/// `Cache-Control` sent on every bypassed response.
pub const BYPASS_CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";

/// Why a response was not cached. Reported in `X-Cache-Reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    Disabled,
    NonStatic,
    CacheControlForbidden,
}

impl BypassReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BypassReason::Disabled => "disabled",
            BypassReason::NonStatic => "non-static",
            BypassReason::CacheControlForbidden => "cache-control-forbidden",
        }
    }
}

/// Outcome of evaluating one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    Store,
    Bypass(BypassReason),
}

impl CacheDecision {
    pub fn is_store(&self) -> bool {
        matches!(self, CacheDecision::Store)
    }
}

/// Strategy-driven cache policy. Built once from [`CacheConfig`].
#[derive(Debug, Clone)]
pub struct CachePolicy {
    strategy: CacheStrategy,
    static_only: bool,
    ttl_secs: u64,
}

impl CachePolicy {
    pub fn new(strategy: CacheStrategy, static_only: bool, ttl_secs: u64) -> Self {
        Self {
            strategy,
            static_only,
            ttl_secs,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.strategy, config.static_only, config.ttl_secs)
    }

    pub fn strategy(&self) -> CacheStrategy {
        self.strategy
    }

    pub fn enabled(&self) -> bool {
        self.strategy != CacheStrategy::Off
    }

    /// Decide whether a response may be stored.
    pub fn evaluate(
        &self,
        path: &str,
        content_type: Option<&str>,
        cache_control: Option<&str>,
    ) -> CacheDecision {
        if self.strategy == CacheStrategy::Off {
            return CacheDecision::Bypass(BypassReason::Disabled);
        }

        if self.static_only && !is_static(Some(path), content_type) {
            return CacheDecision::Bypass(BypassReason::NonStatic);
        }

        match self.strategy {
            CacheStrategy::Force => CacheDecision::Store,
            _ => match cache_control {
                None => CacheDecision::Store,
                Some(value) => {
                    let directives = parse_directives(value);
                    let has = |name: &str| directives.iter().any(|d| d == name);

                    if has("no-store") || has("no-cache") || (has("private") && !self.static_only)
                    {
                        CacheDecision::Bypass(BypassReason::CacheControlForbidden)
                    } else {
                        CacheDecision::Store
                    }
                }
            },
        }
    }

    pub fn should_cache(
        &self,
        path: &str,
        content_type: Option<&str>,
        cache_control: Option<&str>,
    ) -> bool {
        self.evaluate(path, content_type, cache_control).is_store()
    }

    /// `Cache-Control` to emit on a stored or served-from-cache response.
    ///
    /// `None` means the origin's header is kept as-is.
    pub fn stored_cache_control(&self, origin: Option<&str>) -> Option<String> {
        let public = format!("public, max-age={}", self.ttl_secs);
        match (self.strategy, origin) {
            (CacheStrategy::Force, _) => Some(public),
            (_, None) => Some(public),
            (_, Some(_)) => None,
        }
    }
}

/// Lowercased directive names, values dropped (`max-age=60` → `max-age`).
fn parse_directives(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(|d| {
            let name = d.split('=').next().unwrap_or_default().trim();
            (!name.is_empty()).then(|| name.to_ascii_lowercase())
        })
        .collect()
}
