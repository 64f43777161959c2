//! Guards for the cache-management routes.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::http::server::AppState;

/// 403 for every management route while the cache strategy is `off`.
pub async fn require_cache_enabled(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.cache.enabled() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Cache is disabled" })),
        )
            .into_response();
    }
    next.run(request).await
}

/// 401 unless the `token` query parameter equals the configured clear token.
pub async fn require_cache_token(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let supplied = request.uri().query().and_then(query_token);

    match (&state.config.cache.clear_token, supplied) {
        (Some(expected), Some(given)) if *expected == given => next.run(request).await,
        _ => {
            tracing::warn!(path = %request.uri().path(), "Rejected cache management request");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

fn query_token(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "token")
        .map(|(_, v)| v.into_owned())
}
