//! Health endpoint.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Durable tier status, omitted when the cache is memory-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub durable: Option<&'static str>,
}

/// GET /health
///
/// The service stays `UP` while the durable tier is down: the cache keeps
/// serving from memory.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let durable = state
        .cache()
        .check_durable()
        .await
        .map(|result| if result.is_ok() { "UP" } else { "DOWN" });

    Json(HealthResponse {
        status: "UP",
        durable,
    })
}
