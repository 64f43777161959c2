use axum::{extract::State, Json};
use serde::Serialize;

use crate::cache::{CacheInfo, CacheStats};
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct ClearResult {
    pub message: &'static str,
    pub success: bool,
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn cache_info(State(state): State<AppState>) -> Json<CacheInfo> {
    Json(state.pipeline.cache().info())
}

/// Clearing an empty cache is still a success.
pub async fn cache_clear(State(state): State<AppState>) -> Json<ClearResult> {
    let cache = state.pipeline.cache();
    let dropped = cache.info().size;
    cache.clear();
    tracing::info!(entries = dropped, "Cache cleared");

    Json(ClearResult {
        message: "Cache cleared",
        success: true,
    })
}

pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.pipeline.cache().stats())
}
