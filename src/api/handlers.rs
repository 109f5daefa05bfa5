//! API Handlers
//!
//! HTTP request handlers exposing the namespaced cache operations.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::NamespacedCache;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetMultipleRequest, GetResponse, HealthResponse, PatternDeleteResponse,
    PutRequest, PutResponse, StatsResponse, ValuesResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The namespaced cache; safe for concurrent use
    pub cache: Arc<NamespacedCache>,
}

impl AppState {
    /// Creates a new AppState around a cache.
    pub fn new(cache: NamespacedCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }
}

/// Handler for PUT /set
pub async fn put_handler(
    State(state): State<AppState>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.put(&req.key, &req.value).await?;

    Ok(Json(PutResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// An absent key maps to 404 here; the cache itself reports it as `None`.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key).await? {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for POST /get
pub async fn get_multiple_handler(
    State(state): State<AppState>,
    Json(req): Json<GetMultipleRequest>,
) -> Result<Json<ValuesResponse<Option<String>>>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let values = state.cache.get_multiple(&req.keys).await?;
    Ok(Json(ValuesResponse::new(values)))
}

/// Handler for GET /all
pub async fn get_all_handler(
    State(state): State<AppState>,
) -> Result<Json<ValuesResponse<String>>> {
    let values = state.cache.get_all().await?;
    Ok(Json(ValuesResponse::new(values)))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted = state.cache.delete_one(&key).await?;
    Ok(Json(DeleteResponse::new(key, deleted)))
}

/// Handler for DELETE /pattern/:fragment
pub async fn delete_pattern_handler(
    State(state): State<AppState>,
    Path(fragment): Path<String>,
) -> Result<Json<PatternDeleteResponse>> {
    let results = state.cache.delete_by_pattern(&fragment).await?;
    Ok(Json(PatternDeleteResponse::new(fragment, results)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.cache.namespace().prefix(),
        state.cache.stats(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
