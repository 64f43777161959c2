//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: health, cache management, catch-all proxy
//! - Wire up middleware (panic recovery, request ID, tracing)
//! - Own the origin pool and close it once serving stops

use std::any::Any;
use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::admin::admin_router;
use crate::cache::CacheStoreAdapter;
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::proxy::{proxy_handler, ProxyPipeline};
use crate::upstream::{OriginPool, Upstream, UpstreamError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub pipeline: Arc<ProxyPipeline>,
}

/// HTTP server for the mirror.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server forwarding to the configured origin through a pooled client.
    pub fn new(config: ProxyConfig) -> Result<Self, UpstreamError> {
        let pool = OriginPool::new(&config.origin, &config.upstream)?;
        Ok(Self::with_upstream(config, Arc::new(pool)))
    }

    /// Create a server around any [`Upstream`].
    pub fn with_upstream(config: ProxyConfig, upstream: Arc<dyn Upstream>) -> Self {
        let config = Arc::new(config);
        let cache = Arc::new(CacheStoreAdapter::new(&config.cache));
        let pipeline = Arc::new(ProxyPipeline::new(config.clone(), cache, upstream));

        let state = AppState { config, pipeline };
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .merge(admin_router(state.clone()))
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// A clone of the router, for serving or driving with `oneshot` in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.state.config
    }

    pub fn pipeline(&self) -> &Arc<ProxyPipeline> {
        &self.state.pipeline
    }

    /// Serve until `shutdown` fires, then drain in-flight requests and close the pool.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            origin = %self.state.config.origin.base_url(),
            strategy = %self.state.config.cache.strategy,
            "HTTP server starting"
        );

        let result = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await;

        self.state.pipeline.upstream().close();
        tracing::info!("HTTP server stopped");
        result
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");
    ProxyError::Internal(detail.to_string()).into_response()
}
