//! Origin forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! ForwardRequest (method, encoded path, query, headers, body)
//!     → pool.rs (permit from the connection budget)
//!     → pooled keep-alive connection to the single origin
//!     → ForwardResponse (status, reason, headers, buffered body)
//! ```
//!
//! # Design Decisions
//! - One origin, one pool; the pool alone sizes and reuses connections
//! - Every call has a deadline; expiry is a distinct error (504, not 502)
//! - No retries: each client request is a single origin attempt
//! - Redirects are returned to the caller, never followed

pub mod pool;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use thiserror::Error;

pub use pool::OriginPool;

/// Request handed to the origin pool.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    /// Already percent-encoded path.
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ForwardRequest {
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) if !q.is_empty() => format!("{}?{}", self.path, q),
            _ => self.path.clone(),
        }
    }
}

/// Fully buffered origin response.
#[derive(Debug, Clone)]
pub struct ForwardResponse {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("origin request timed out")]
    Timeout,

    #[error("could not connect to origin: {0}")]
    Connect(String),

    #[error("origin protocol error: {0}")]
    Protocol(String),
}

impl UpstreamError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Timeout => "timeout",
            UpstreamError::Connect(_) => "connect",
            UpstreamError::Protocol(_) => "protocol",
        }
    }
}

/// The origin connection pool seen by the pipeline.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn forward(&self, request: ForwardRequest) -> Result<ForwardResponse, UpstreamError>;

    /// Release pooled connections. Called once at shutdown.
    fn close(&self) {}
}
