//! Request handling and transformation.
//!
//! # Responsibilities
//! - Tag every request with an `x-request-id` (UUID v4) for tracing
//! - Work out the mirror's own scheme and host as seen by the client
//! - Prepare headers for forwarding to the origin
//!
//! # Design Decisions
//! - `accept-encoding` is never forwarded; passing the client's value through
//!   led to corrupted bodies, so encoding is left to the origin pool
//! - Framing headers are rebuilt by the pool, never copied
//! - `Host` always names the origin, whatever the client sent

use axum::http::header::{self, HeaderValue};
use axum::http::{HeaderMap, Uri};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::http::headers::HeaderBag;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Headers never copied onto the origin request.
const OUTBOUND_STRIPPED: &[&str] = &[
    "accept-encoding",
    "connection",
    "keep-alive",
    "content-length",
    "transfer-encoding",
    "host",
];

/// Layer that assigns a request ID when the client sent none.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer that copies the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Build the header set sent to the origin.
pub fn outbound_headers(inbound: impl Into<HeaderBag>, origin_host: &str) -> HeaderMap {
    let mut headers = inbound.into().without(OUTBOUND_STRIPPED).into_inner();
    if let Ok(host) = HeaderValue::from_str(origin_host) {
        headers.insert(header::HOST, host);
    }
    headers
}

/// How the client reached the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorOrigin {
    pub scheme: String,
    pub host: String,
}

impl MirrorOrigin {
    /// Resolve from forwarding headers, then `Host`, then `fallback_host`.
    pub fn from_headers(headers: &HeaderMap, fallback_host: &str) -> Self {
        let first = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let scheme = first("x-forwarded-proto")
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_else(|| "http".to_string());
        let host = first("x-forwarded-host")
            .or_else(|| first(header::HOST.as_str()))
            .unwrap_or_else(|| fallback_host.to_string());

        Self { scheme, host }
    }

    /// As [`from_headers`](Self::from_headers), but an absolute-form or HTTP/2
    /// `:authority` on the request URI is preferred over the listener address.
    pub fn resolve(headers: &HeaderMap, uri: &Uri, bind_address: &str) -> Self {
        match uri.authority() {
            Some(authority) => Self::from_headers(headers, authority.as_str()),
            None => Self::from_headers(headers, bind_address),
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::HOST, HeaderValue::from_static("mirror.local"));
        h.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip, br"));
        h.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        h.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        h.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        h.insert(header::COOKIE, HeaderValue::from_static("sid=1"));
        h.insert(X_REQUEST_ID, HeaderValue::from_static("abc"));
        h
    }

    #[test]
    fn test_outbound_strips_framing_and_rewrites_host() {
        let out = outbound_headers(&inbound(), "origin.example");
        assert_eq!(out.get(header::HOST).unwrap(), "origin.example");
        assert!(out.get(header::ACCEPT_ENCODING).is_none());
        assert!(out.get(header::CONNECTION).is_none());
        assert!(out.get("keep-alive").is_none());
        assert!(out.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(out.get(header::COOKIE).unwrap(), "sid=1");
        assert_eq!(out.get(X_REQUEST_ID).unwrap(), "abc");
    }

    #[test]
    fn test_host_is_set_even_when_absent() {
        let out = outbound_headers(HeaderMap::new(), "origin.example:8443");
        assert_eq!(out.get(header::HOST).unwrap(), "origin.example:8443");
    }

    #[test]
    fn test_mirror_origin_resolution() {
        let mirror = MirrorOrigin::from_headers(&inbound(), "0.0.0.0:8080");
        assert_eq!(mirror.base_url(), "http://mirror.local");

        let mut h = inbound();
        h.insert("x-forwarded-proto", HeaderValue::from_static("HTTPS, http"));
        h.insert("x-forwarded-host", HeaderValue::from_static("public.example"));
        let mirror = MirrorOrigin::from_headers(&h, "0.0.0.0:8080");
        assert_eq!(mirror.base_url(), "https://public.example");

        let mirror = MirrorOrigin::from_headers(&HeaderMap::new(), "127.0.0.1:8080");
        assert_eq!(mirror.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_hostless_request_uses_uri_authority() {
        let uri: Uri = "http://mirror.example:8080/page".parse().unwrap();
        let mirror = MirrorOrigin::resolve(&HeaderMap::new(), &uri, "0.0.0.0:8080");
        assert_eq!(mirror.host, "mirror.example:8080");

        let uri: Uri = "/page".parse().unwrap();
        let mirror = MirrorOrigin::resolve(&HeaderMap::new(), &uri, "0.0.0.0:8080");
        assert_eq!(mirror.host, "0.0.0.0:8080");

        // An explicit Host header still wins.
        let uri: Uri = "http://other.example/page".parse().unwrap();
        let mirror = MirrorOrigin::resolve(&inbound(), &uri, "0.0.0.0:8080");
        assert_eq!(mirror.host, "mirror.local");
    }
}
