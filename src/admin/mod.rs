//! Health and cache-management endpoints.
//!
//! These routes are matched before the catch-all proxy route and never reach
//! the pipeline. Guard order: cache enabled (403), then token (401).
//! `/cache/stats` is guarded only by the enabled check.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::{require_cache_enabled, require_cache_token};
use self::handlers::*;
use crate::http::server::AppState;

pub fn admin_router(state: AppState) -> Router<AppState> {
    let token_guarded = Router::new()
        .route("/cache/info", get(cache_info))
        .route("/cache/clear", get(cache_clear))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_cache_token,
        ));

    let management = Router::new()
        .merge(token_guarded)
        .route("/cache/stats", get(cache_stats))
        .route_layer(middleware::from_fn_with_state(state, require_cache_enabled));

    Router::new().route("/health", get(health)).merge(management)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::{CacheStrategy, ProxyConfig};
    use crate::http::HttpServer;
    use crate::upstream::{ForwardRequest, ForwardResponse, Upstream, UpstreamError};

    struct Unreachable;

    #[async_trait]
    impl Upstream for Unreachable {
        async fn forward(&self, _: ForwardRequest) -> Result<ForwardResponse, UpstreamError> {
            Err(UpstreamError::Connect("unreachable".into()))
        }
    }

    fn app(strategy: CacheStrategy, token: Option<&str>) -> axum::Router {
        let mut config = ProxyConfig::default();
        config.cache.strategy = strategy;
        config.cache.clear_token = token.map(str::to_string);
        HttpServer::with_upstream(config, Arc::new(Unreachable)).router()
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health_is_always_ok() {
        let (status, body) = get(app(CacheStrategy::Off, None), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_disabled_cache_is_forbidden_before_token_check() {
        for uri in ["/cache/info", "/cache/clear?token=t", "/cache/stats"] {
            let (status, body) = get(app(CacheStrategy::Off, Some("t")), uri).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert_eq!(body, r#"{"error":"Cache is disabled"}"#);
        }
    }

    #[tokio::test]
    async fn test_token_rules() {
        let (status, body) = get(app(CacheStrategy::Auto, Some("t")), "/cache/info?token=x").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Unauthorized");

        let (status, _) = get(app(CacheStrategy::Auto, Some("t")), "/cache/clear").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // No configured token locks the endpoints.
        let (status, _) = get(app(CacheStrategy::Auto, None), "/cache/info?token=").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = get(app(CacheStrategy::Force, Some("t")), "/cache/info?token=t").await;
        assert_eq!(status, StatusCode::OK);
        let info: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(info["size"], 0);
        assert_eq!(info["max"], 1000);
        assert_eq!(info["ttl"], 3600);
        assert_eq!(info["calculatedSize"], 0);
        assert_eq!(info["strategy"], "force");
        assert_eq!(info["staticOnly"], false);
    }

    #[tokio::test]
    async fn test_clear_on_empty_cache_succeeds() {
        let (status, body) = get(app(CacheStrategy::Auto, Some("t")), "/cache/clear?token=t").await;
        assert_eq!(status, StatusCode::OK);
        let result: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["message"], "Cache cleared");
    }

    #[tokio::test]
    async fn test_stats_needs_no_token() {
        let (status, body) = get(app(CacheStrategy::Auto, Some("t")), "/cache/stats").await;
        assert_eq!(status, StatusCode::OK);
        let stats: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(stats["total"], 0);
        assert_eq!(stats["strategy"], "auto");
        assert!(stats["entries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_paths_reach_the_proxy() {
        let (status, body) = get(app(CacheStrategy::Auto, None), "/cache/other").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, r#"{"error":"Bad Gateway"}"#);
    }
}
