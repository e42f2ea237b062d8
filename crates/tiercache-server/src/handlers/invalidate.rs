//! Invalidation endpoints.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InvalidateRequest {
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    /// Number of memory entries removed.
    pub invalidated: usize,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

/// POST /cache/invalidate
#[instrument(skip_all, fields(tags = ?body.tags))]
pub async fn invalidate_tags(
    State(state): State<AppState>,
    Json(body): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>, AppError> {
    if body.tags.is_empty() {
        return Err(AppError::BadRequest("tags must not be empty".to_string()));
    }
    if body.tags.iter().any(String::is_empty) {
        return Err(AppError::BadRequest("tag must not be empty".to_string()));
    }

    let result = state.cache().invalidate_by_tags(body.tags).await;

    Ok(Json(InvalidateResponse {
        invalidated: result.count,
        tags: result.tags,
    }))
}

/// DELETE /cache
#[instrument(skip_all)]
pub async fn clear_cache(State(state): State<AppState>) -> Json<ClearResponse> {
    let count = state.cache().len();
    state.cache().clear().await;

    tracing::info!(count, "cache cleared over HTTP");

    Json(ClearResponse { cleared: true })
}
