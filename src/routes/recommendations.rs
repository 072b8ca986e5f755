use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{
    error::{AppError, AppResult},
    models::{Candidate, Domain, RecommendationResult},
};

/// Header carrying the authenticated user, set by the upstream auth layer
pub const USER_ID_HEADER: &str = "x-user-id";

/// Largest accepted `top_k`
pub const MAX_TOP_K: usize = 50;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DomainRecommendationResponse {
    pub domain: Domain,
    pub candidates: Vec<Candidate>,
    pub degraded: bool,
}

fn user_id(headers: &HeaderMap) -> AppResult<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidInput(format!("Missing {} header", USER_ID_HEADER)))
}

fn resolve_top_k(query: &RecommendationQuery, default_top_k: usize) -> AppResult<usize> {
    let top_k = query.top_k.unwrap_or(default_top_k);
    if !(1..=MAX_TOP_K).contains(&top_k) {
        return Err(AppError::InvalidInput(format!(
            "top_k must be between 1 and {}",
            MAX_TOP_K
        )));
    }
    Ok(top_k)
}

/// Handler for recommendations across all domains
pub async fn recommend(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResult>> {
    let user_id = user_id(&headers)?;
    let top_k = resolve_top_k(&query, state.default_top_k)?;

    let result = state.recommender.recommend(&user_id, top_k).await?;
    Ok(Json(result))
}

/// Handler for recommendations in one domain
pub async fn recommend_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    headers: HeaderMap,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<DomainRecommendationResponse>> {
    let domain: Domain = domain.parse()?;
    let user_id = user_id(&headers)?;
    let top_k = resolve_top_k(&query, state.default_top_k)?;

    let recs = state
        .recommender
        .recommend_domain(&user_id, domain, top_k)
        .await?;

    Ok(Json(DomainRecommendationResponse {
        domain,
        candidates: recs.candidates,
        degraded: recs.degraded,
    }))
}
