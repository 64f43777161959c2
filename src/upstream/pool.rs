//! Keep-alive connection pool to the origin.
//!
//! # Responsibilities
//! - Hold reusable connections to the one configured origin
//! - Bound concurrent origin exchanges to `max_connections`
//! - Enforce the request deadline across connect, send and body read
//! - Classify failures as timeout, connect or protocol errors

use std::time::Duration;

use async_trait::async_trait;
use hyper::ext::ReasonPhrase;
use parking_lot::RwLock;
use tokio::sync::Semaphore;

use crate::config::{OriginTarget, UpstreamConfig};
use crate::upstream::{ForwardRequest, ForwardResponse, Upstream, UpstreamError};

/// Connection pool bound to a single origin.
pub struct OriginPool {
    base_url: String,
    client: RwLock<Option<reqwest::Client>>,
    permits: Semaphore,
    timeout: Duration,
}

impl OriginPool {
    pub fn new(origin: &OriginTarget, config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.max_connections)
            .pool_idle_timeout(config.keep_alive_timeout())
            .tcp_keepalive(config.keep_alive_timeout())
            .timeout(config.request_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
            .map_err(|e| UpstreamError::Protocol(e.to_string()))?;

        tracing::info!(
            origin = %origin.base_url(),
            max_connections = config.max_connections,
            keep_alive_ms = config.keep_alive_timeout_ms,
            timeout_ms = config.request_timeout_ms,
            "Origin pool ready"
        );

        Ok(Self {
            base_url: origin.base_url(),
            client: RwLock::new(Some(client)),
            permits: Semaphore::new(config.max_connections.max(1)),
            timeout: config.request_timeout(),
        })
    }

    async fn exchange(
        &self,
        client: reqwest::Client,
        request: ForwardRequest,
    ) -> Result<ForwardResponse, UpstreamError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| UpstreamError::Protocol("pool closed".into()))?;

        let url = format!("{}{}", self.base_url, request.path_and_query());
        let mut builder = client.request(request.method, &url).headers(request.headers);
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let status_text = response
            .extensions()
            .get::<ReasonPhrase>()
            .and_then(|r| std::str::from_utf8(r.as_bytes()).ok())
            .or_else(|| status.canonical_reason())
            .unwrap_or_default()
            .to_string();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify)?;

        Ok(ForwardResponse {
            status,
            status_text,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Upstream for OriginPool {
    async fn forward(&self, request: ForwardRequest) -> Result<ForwardResponse, UpstreamError> {
        let client = self
            .client
            .read()
            .clone()
            .ok_or_else(|| UpstreamError::Protocol("pool closed".into()))?;

        tokio::time::timeout(self.timeout, self.exchange(client, request))
            .await
            .map_err(|_| UpstreamError::Timeout)?
    }

    fn close(&self) {
        if self.client.write().take().is_some() {
            self.permits.close();
            tracing::info!(origin = %self.base_url, "Origin pool closed");
        }
    }
}

fn classify(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout
    } else if err.is_connect() {
        UpstreamError::Connect(err.to_string())
    } else {
        UpstreamError::Protocol(err.to_string())
    }
}
