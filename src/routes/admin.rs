use axum::{extract::State, Json};
use serde_json::{json, Value};

use super::AppState;
use crate::{db::CacheStats, error::AppResult};

/// Entry counts and TTLs of the result cache
pub async fn cache_stats(State(state): State<AppState>) -> AppResult<Json<CacheStats>> {
    let stats = state.recommender.cache().stats().await?;
    Ok(Json(stats))
}

/// Drops every cached vector query and recommendation result
pub async fn clear_cache(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let removed = state.recommender.cache().clear().await?;
    Ok(Json(json!({ "removed": removed })))
}
