//! Catch-all axum handler feeding the pipeline.

use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::error::ProxyError;
use crate::http::request::{MirrorOrigin, X_REQUEST_ID};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::proxy::pipeline::InboundRequest;

/// Proxy any request that is not a health or cache-management route.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();

    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
        "Proxying request"
    );

    let body = if parts.method == Method::GET {
        Bytes::new()
    } else {
        let limit = state.config.limits.max_body_bytes;
        match axum::body::to_bytes(body, limit).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(request_id = %request_id, limit, error = %e, "Request body rejected");
                return finish(&parts.method, ProxyError::PayloadTooLarge { limit }.into_response(), start);
            }
        }
    };

    let inbound = InboundRequest {
        method: parts.method.clone(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        mirror: MirrorOrigin::resolve(&parts.headers, &parts.uri, &state.config.listener.bind_address),
        headers: parts.headers,
        body,
    };

    let response = match state.pipeline.handle(inbound).await {
        Ok(draft) => draft.finish(),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Proxy request failed");
            e.into_response()
        }
    };
    finish(&parts.method, response, start)
}

fn finish(method: &Method, response: Response, start: Instant) -> Response {
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}
