//! Entry endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiercache_core::validation::ttl_from_millis;
use tracing::instrument;

use crate::cache::SetOptions;
use crate::error::AppError;
use crate::metrics::CacheStats;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub struct PutEntryRequest {
    pub value: Value,
    /// TTL in milliseconds; the configured default applies when absent.
    #[serde(default)]
    pub ttl_ms: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub key: String,
}

/// GET /cache/entries/{*key}
#[instrument(skip(state))]
pub async fn get_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntryResponse>, AppError> {
    match state.cache().get(&key).await {
        Some(value) => Ok(Json(EntryResponse { key, value })),
        None => Err(AppError::NotFound { key }),
    }
}

/// PUT /cache/entries/{*key}
#[instrument(skip(state, body), fields(tags = ?body.tags, ttl_ms = ?body.ttl_ms))]
pub async fn put_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<PutEntryRequest>,
) -> Result<StatusCode, AppError> {
    let mut options = SetOptions::new().tags(body.tags);
    if let Some(millis) = body.ttl_ms {
        options = options.ttl(ttl_from_millis(millis)?);
    }

    state.cache().set(key, body.value, options)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /cache/entries/{*key}
#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    let deleted = state.cache().delete(&key).await;
    Json(DeleteResponse { deleted, key })
}

/// GET /cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache().get_stats())
}
