//! Error types surfaced to clients.
//!
//! Internal detail is logged where the error is raised and never placed in
//! a response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::upstream::UpstreamError;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Terminal failures of a proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("origin did not respond in time")]
    GatewayTimeout,

    #[error("origin request failed: {0}")]
    BadGateway(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UpstreamError> for ProxyError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Timeout => ProxyError::GatewayTimeout,
            other => ProxyError::BadGateway(other.to_string()),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::GatewayTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                Json(json!({ "error": "Gateway Timeout" })),
            )
                .into_response(),
            ProxyError::BadGateway(_) => (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Bad Gateway" })),
            )
                .into_response(),
            ProxyError::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "overflow :(").into_response()
            }
            ProxyError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal Server Error" })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_mapping() {
        assert!(matches!(
            ProxyError::from(UpstreamError::Timeout),
            ProxyError::GatewayTimeout
        ));
        assert!(matches!(
            ProxyError::from(UpstreamError::Connect("refused".into())),
            ProxyError::BadGateway(_)
        ));
        assert_eq!(
            ProxyError::from(UpstreamError::Protocol("reset".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_responses_do_not_leak_detail() {
        let response = ProxyError::BadGateway("10.0.0.3 refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = ProxyError::Internal("secret".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ProxyError::PayloadTooLarge { limit: 1 }.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
