//! Response handling and transformation.
//!
//! # Responsibilities
//! - Strip origin framing headers before re-framing the body
//! - Assemble the client response in one mutable draft, emitted once
//! - Carry the origin's reason phrase when it is not the canonical one
//!
//! # Design Decisions
//! - The body is buffered and re-framed here, so any declared
//!   encoding/length from the origin would be wrong and is dropped
//! - Diagnostic `X-Cache*` headers are observability only

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use hyper::ext::ReasonPhrase;

use crate::http::headers::HeaderBag;

pub const X_CACHE: &str = "x-cache";
pub const X_CACHE_STRATEGY: &str = "x-cache-strategy";
pub const X_CACHE_REASON: &str = "x-cache-reason";
pub const X_CACHE_KEY: &str = "x-cache-key";

/// Headers never copied from the origin response.
const INBOUND_STRIPPED: &[&str] = &["content-encoding", "transfer-encoding", "content-length"];

/// Build the header set returned to the client from an origin header source.
pub fn inbound_headers(origin: impl Into<HeaderBag>) -> HeaderMap {
    origin.into().without(INBOUND_STRIPPED).into_inner()
}

/// A response under construction: status, headers and body mutated in place,
/// then emitted once with [`ResponseDraft::finish`].
#[derive(Debug, Clone)]
pub struct ResponseDraft {
    status: StatusCode,
    status_text: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl ResponseDraft {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            status_text: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Keep a non-canonical reason phrase (e.g. `200 Fine`).
    pub fn with_status_text(mut self, text: &str) -> Self {
        if !text.is_empty() && self.status.canonical_reason() != Some(text) {
            self.status_text = Some(text.to_string());
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Reason phrase that will be sent.
    pub fn status_text(&self) -> &str {
        self.status_text
            .as_deref()
            .or_else(|| self.status.canonical_reason())
            .unwrap_or_default()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replace a header. Invalid values are dropped with a log line.
    pub fn set_header(&mut self, name: &'static str, value: &str) -> &mut Self {
        match HeaderValue::from_str(value) {
            Ok(v) => {
                self.headers.insert(HeaderName::from_static(name), v);
            }
            Err(_) => tracing::warn!(header = name, "Dropping invalid header value"),
        }
        self
    }

    pub fn set_body(&mut self, body: Bytes) -> &mut Self {
        self.body = body;
        self
    }

    /// Emit the final response.
    pub fn finish(self) -> Response {
        let mut response = (self.status, self.headers, Body::from(self.body)).into_response();
        if let Some(text) = self.status_text {
            if let Ok(reason) = ReasonPhrase::try_from(text) {
                response.extensions_mut().insert(reason);
            }
        }
        response
    }
}

impl IntoResponse for ResponseDraft {
    fn into_response(self) -> Response {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn test_inbound_strips_framing() {
        let origin: HeaderBag = [
            ("Content-Encoding", "gzip"),
            ("Transfer-Encoding", "chunked"),
            ("Content-Length", "42"),
            ("Content-Type", "text/plain"),
            ("ETag", "\"v1\""),
        ]
        .into_iter()
        .collect();

        let headers = inbound_headers(origin);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(headers.get(header::ETAG).unwrap(), "\"v1\"");
    }

    #[test]
    fn test_draft_mutates_in_place() {
        let mut draft = ResponseDraft::new(StatusCode::OK).with_body(Bytes::from_static(b"hi"));
        draft
            .set_header(X_CACHE, "MISS (Cached)")
            .set_header(X_CACHE_STRATEGY, "auto")
            .set_header(X_CACHE, "HIT");
        draft.set_header(X_CACHE_KEY, "bad\nvalue");

        assert_eq!(draft.header(X_CACHE), Some("HIT"));
        assert_eq!(draft.header(X_CACHE_STRATEGY), Some("auto"));
        assert_eq!(draft.header(X_CACHE_KEY), None);

        let response = draft.finish();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(X_CACHE).unwrap(), "HIT");
    }

    #[test]
    fn test_status_text() {
        let draft = ResponseDraft::new(StatusCode::OK).with_status_text("OK");
        assert_eq!(draft.status_text(), "OK");
        assert!(draft.status_text.is_none());

        let draft = ResponseDraft::new(StatusCode::OK).with_status_text("Fine");
        assert_eq!(draft.status_text(), "Fine");
        let response = draft.finish();
        assert!(response.extensions().get::<ReasonPhrase>().is_some());
    }
}
