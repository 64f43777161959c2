//! Per-request proxy pipeline.
//!
//! ```text
//! ReceiveRequest
//!   → CacheLookup (GET only)
//!       hit  → EmitCached
//!       miss → Forward → ClassifyResponse
//!                  3xx + Location → RewriteLocation → EmitRedirect
//!                  304            → EmitBareHeaders
//!                  other          → ApplyPolicy → Store + Emit | BypassEmit
//! ```
//!
//! Every branch ends in exactly one [`ResponseDraft`] carrying `X-Cache`
//! diagnostics. Non-GET requests never touch the cache.

use std::sync::Arc;

use axum::http::header::{self, HeaderMap};
use axum::http::{Method, StatusCode};
use bytes::Bytes;

use crate::cache::{
    BypassReason, CacheDecision, CacheEntry, CachePolicy, CacheStoreAdapter, BYPASS_CACHE_CONTROL,
};
use crate::config::ProxyConfig;
use crate::error::Result;
use crate::http::request::{outbound_headers, MirrorOrigin};
use crate::http::response::{
    inbound_headers, ResponseDraft, X_CACHE, X_CACHE_KEY, X_CACHE_REASON, X_CACHE_STRATEGY,
};
use crate::observability::metrics;
use crate::rewrite::{encode_path, fix_redirect_location, HtmlRewriter};
use crate::upstream::{ForwardRequest, ForwardResponse, Upstream};

/// A client request after the body has been read.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Raw path as received.
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub mirror: MirrorOrigin,
}

impl InboundRequest {
    /// Path plus query, the cache key input.
    pub fn url(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }
}

/// Orchestrates cache lookup, forwarding, rewriting and storing.
pub struct ProxyPipeline {
    config: Arc<ProxyConfig>,
    cache: Arc<CacheStoreAdapter>,
    policy: CachePolicy,
    upstream: Arc<dyn Upstream>,
    html: HtmlRewriter,
}

impl ProxyPipeline {
    pub fn new(
        config: Arc<ProxyConfig>,
        cache: Arc<CacheStoreAdapter>,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        let policy = CachePolicy::from_config(&config.cache);
        let html = HtmlRewriter::new(config.origin.host.clone(), config.inject.clone());
        Self {
            config,
            cache,
            policy,
            upstream,
            html,
        }
    }

    pub fn cache(&self) -> &Arc<CacheStoreAdapter> {
        &self.cache
    }

    pub fn upstream(&self) -> &Arc<dyn Upstream> {
        &self.upstream
    }

    /// Run one request through the pipeline.
    pub async fn handle(&self, request: InboundRequest) -> Result<ResponseDraft> {
        let url = request.url();
        let cacheable_method = request.method == Method::GET;

        if cacheable_method && self.cache.enabled() {
            if let Some(entry) = self.cache.lookup(&url) {
                tracing::debug!(url = %url, "Cache hit");
                metrics::record_cache_event("hit");
                return Ok(self.emit_cached(&entry, &request.mirror));
            }
        }

        let forward = ForwardRequest {
            method: request.method.clone(),
            path: encode_path(&request.path),
            query: request.query.clone(),
            headers: outbound_headers(&request.headers, &self.config.origin.host),
            body: request.body.clone(),
        };

        let response = match self.upstream.forward(forward).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %url, method = %request.method, error = %e, "Origin request failed");
                metrics::record_upstream_error(e.kind());
                return Err(e.into());
            }
        };

        if response.status == StatusCode::NOT_MODIFIED {
            return Ok(self.emit_not_modified(response));
        }
        if response.status.is_redirection() && response.headers.contains_key(header::LOCATION) {
            return Ok(self.emit_redirect(response, &request.mirror, &url));
        }

        // Only 200 responses to GET are ever candidates for the cache.
        if !cacheable_method || response.status != StatusCode::OK {
            let reason = (!self.policy.enabled()).then_some(BypassReason::Disabled);
            return Ok(self.emit_bypass(response, &request.mirror, reason));
        }

        let content_type = header_str(&response.headers, header::CONTENT_TYPE.as_str());
        let cache_control = header_str(&response.headers, header::CACHE_CONTROL.as_str());

        match self
            .policy
            .evaluate(&request.path, content_type.as_deref(), cache_control.as_deref())
        {
            CacheDecision::Store => {
                let stored = self.cache.store(
                    &url,
                    response.status,
                    &response.status_text,
                    &response.headers,
                    content_type.as_deref(),
                    response.body.clone(),
                );
                if stored {
                    tracing::debug!(url = %url, size = response.body.len(), "Response cached");
                    metrics::record_cache_event("miss_stored");
                    Ok(self.emit_stored(response, &request.mirror, &url))
                } else {
                    Ok(self.emit_bypass(response, &request.mirror, None))
                }
            }
            CacheDecision::Bypass(reason) => {
                tracing::debug!(url = %url, reason = reason.as_str(), "Cache bypass");
                Ok(self.emit_bypass(response, &request.mirror, Some(reason)))
            }
        }
    }

    fn emit_cached(&self, entry: &CacheEntry, mirror: &MirrorOrigin) -> ResponseDraft {
        let mut draft = ResponseDraft::new(entry.status)
            .with_status_text(&entry.status_text)
            .with_headers(inbound_headers(&entry.headers));
        draft.set_body(self.rewrite_body(
            entry.content_type.as_deref(),
            entry.body.clone(),
            mirror,
        ));

        let origin_cc = header_str(&entry.headers, header::CACHE_CONTROL.as_str());
        if let Some(cc) = self.policy.stored_cache_control(origin_cc.as_deref()) {
            draft.set_header("cache-control", &cc);
        }
        draft
            .set_header(X_CACHE, "HIT")
            .set_header(X_CACHE_KEY, &entry.key)
            .set_header(X_CACHE_STRATEGY, self.policy.strategy().as_str());
        draft
    }

    fn emit_stored(&self, response: ForwardResponse, mirror: &MirrorOrigin, url: &str) -> ResponseDraft {
        let origin_cc = header_str(&response.headers, header::CACHE_CONTROL.as_str());
        let mut draft = self.draft_from(response, mirror);
        if let Some(cc) = self.policy.stored_cache_control(origin_cc.as_deref()) {
            draft.set_header("cache-control", &cc);
        }
        draft
            .set_header(X_CACHE, "MISS (Cached)")
            .set_header(X_CACHE_KEY, &CacheStoreAdapter::cache_key(url))
            .set_header(X_CACHE_STRATEGY, self.policy.strategy().as_str());
        draft
    }

    fn emit_bypass(
        &self,
        response: ForwardResponse,
        mirror: &MirrorOrigin,
        reason: Option<BypassReason>,
    ) -> ResponseDraft {
        metrics::record_cache_event("bypass");
        let mut draft = self.draft_from(response, mirror);
        draft
            .set_header("cache-control", BYPASS_CACHE_CONTROL)
            .set_header(X_CACHE, "BYPASS")
            .set_header(X_CACHE_STRATEGY, self.policy.strategy().as_str());
        if let Some(reason) = reason {
            draft.set_header(X_CACHE_REASON, reason.as_str());
        }
        draft
    }

    fn emit_redirect(&self, response: ForwardResponse, mirror: &MirrorOrigin, url: &str) -> ResponseDraft {
        let location = header_str(&response.headers, header::LOCATION.as_str()).unwrap_or_default();
        let mut draft = self.draft_from(response, mirror);

        match fix_redirect_location(
            &location,
            &mirror.scheme,
            &mirror.host,
            &self.config.origin.protocol,
            &self.config.origin.host,
        ) {
            Some(fixed) => {
                draft.set_header("location", &fixed);
            }
            None => {
                tracing::warn!(
                    url = %url,
                    location = %location,
                    "Could not rewrite redirect location; forwarding it unmodified"
                );
            }
        }
        draft
            .set_header(X_CACHE, "BYPASS")
            .set_header(X_CACHE_STRATEGY, self.policy.strategy().as_str());
        draft
    }

    fn emit_not_modified(&self, response: ForwardResponse) -> ResponseDraft {
        let mut draft = ResponseDraft::new(response.status)
            .with_status_text(&response.status_text)
            .with_headers(inbound_headers(response.headers));
        draft
            .set_header(X_CACHE, "BYPASS")
            .set_header(X_CACHE_STRATEGY, self.policy.strategy().as_str());
        draft
    }

    /// Status, filtered headers and (possibly rewritten) body of an origin response.
    fn draft_from(&self, response: ForwardResponse, mirror: &MirrorOrigin) -> ResponseDraft {
        let content_type = header_str(&response.headers, header::CONTENT_TYPE.as_str());
        let body = self.rewrite_body(content_type.as_deref(), response.body, mirror);
        ResponseDraft::new(response.status)
            .with_status_text(&response.status_text)
            .with_headers(inbound_headers(response.headers))
            .with_body(body)
    }

    /// HTML link rewriting; anything that cannot be rewritten is returned untouched.
    fn rewrite_body(&self, content_type: Option<&str>, body: Bytes, mirror: &MirrorOrigin) -> Bytes {
        if !HtmlRewriter::applies_to(content_type) {
            return body;
        }
        match self.html.transform(&body, &mirror.scheme, &mirror.host) {
            Some(rewritten) => rewritten,
            None => {
                tracing::debug!("HTML body is not UTF-8; forwarding unmodified");
                body
            }
        }
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
