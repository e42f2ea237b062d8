//! Application state.

use std::sync::Arc;

use serde_json::Value;

use crate::cache::CacheManager;

/// The cache served over HTTP stores arbitrary JSON values.
pub type JsonCache = CacheManager<Value>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    cache: Arc<JsonCache>,
}

impl AppState {
    pub fn new(cache: Arc<JsonCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &JsonCache {
        &self.cache
    }
}
