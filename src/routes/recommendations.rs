use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::context::ViewerContext;
use crate::db::CacheKey;
use crate::error::AppResult;
use crate::services::{self, CatalogSummary, DEFAULT_RECOMMENDATION_LIMIT};
use crate::state::AppState;

/// Affinity drifts slowly; five minutes of staleness is acceptable
const RECOMMENDATIONS_CACHE_TTL: u64 = 300;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_RECOMMENDATION_LIMIT
}

/// Handler for personalized recommendations, cached per viewer
pub async fn recommend(
    State(state): State<AppState>,
    viewer: ViewerContext,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<CatalogSummary>>> {
    let cache_key = CacheKey::Recommendations {
        account_id: viewer.account_id,
        profile_id: viewer.profile_id,
        limit: params.limit,
    };

    if let Some(cache) = &state.cache {
        match cache.get::<Vec<CatalogSummary>>(&cache_key).await {
            Ok(Some(cached)) => return Ok(Json(cached)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Recommendation cache read failed, computing fresh"),
        }
    }

    let recommendations = services::recommendations(
        state.watch.as_ref(),
        state.catalog.as_ref(),
        state.profiles.as_ref(),
        &viewer,
        params.limit,
    )
    .await?;

    if let Some(cache) = &state.cache {
        cache.put_in_background(&cache_key, &recommendations, RECOMMENDATIONS_CACHE_TTL);
    }

    Ok(Json(recommendations))
}
