use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::context::ViewerContext;
use crate::db::CacheKey;
use crate::error::AppResult;
use crate::models::{WatchKey, WatchRecord};
use crate::services::{
    self, ContinueWatchingEntry, HistoryPage, ProgressReport, WatchStats, DEFAULT_SHELF_LIMIT,
    DEFAULT_STATS_WINDOW_DAYS,
};
use crate::state::AppState;

/// Cached stats go stale after ten minutes at most
const STATS_CACHE_TTL: u64 = 600;

/// Handler for player progress reports
pub async fn record_progress(
    State(state): State<AppState>,
    viewer: ViewerContext,
    Path(content_id): Path<Uuid>,
    Json(report): Json<ProgressReport>,
) -> AppResult<Json<WatchRecord>> {
    let record = services::record_progress(
        state.watch.as_ref(),
        state.catalog.as_ref(),
        &viewer,
        content_id,
        report,
    )
    .await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_page_size")]
    page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    services::history::DEFAULT_PAGE_SIZE
}

/// Handler for the paginated watch history
pub async fn history(
    State(state): State<AppState>,
    viewer: ViewerContext,
    Query(params): Query<HistoryQuery>,
) -> AppResult<Json<HistoryPage>> {
    let page = services::watch_history(
        state.watch.as_ref(),
        state.catalog.as_ref(),
        &viewer,
        params.page,
        params.page_size,
    )
    .await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct ShelfQuery {
    #[serde(default = "default_shelf_limit")]
    limit: usize,
}

fn default_shelf_limit() -> usize {
    DEFAULT_SHELF_LIMIT
}

/// Handler for the continue-watching shelf
pub async fn continue_watching(
    State(state): State<AppState>,
    viewer: ViewerContext,
    Query(params): Query<ShelfQuery>,
) -> AppResult<Json<Vec<ContinueWatchingEntry>>> {
    let shelf = services::continue_watching(
        state.watch.as_ref(),
        state.catalog.as_ref(),
        &viewer,
        params.limit,
    )
    .await?;
    Ok(Json(shelf))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default = "default_stats_window")]
    days: i64,
}

fn default_stats_window() -> i64 {
    DEFAULT_STATS_WINDOW_DAYS
}

/// Handler for viewing statistics, cached per viewer and window
pub async fn stats(
    State(state): State<AppState>,
    viewer: ViewerContext,
    Query(params): Query<StatsQuery>,
) -> AppResult<Json<WatchStats>> {
    let cache_key = CacheKey::WatchStats {
        account_id: viewer.account_id,
        profile_id: viewer.profile_id,
        days: params.days,
    };

    if let Some(cache) = &state.cache {
        match cache.get::<WatchStats>(&cache_key).await {
            Ok(Some(stats)) => return Ok(Json(stats)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Stats cache read failed, computing fresh"),
        }
    }

    let stats = services::watch_stats(
        state.watch.as_ref(),
        state.catalog.as_ref(),
        &viewer,
        params.days,
    )
    .await?;

    if let Some(cache) = &state.cache {
        cache.put_in_background(&cache_key, &stats, STATS_CACHE_TTL);
    }

    Ok(Json(stats))
}

/// Handler for clearing one item from the history. Idempotent: clearing
/// an absent record is still a success.
pub async fn delete_record(
    State(state): State<AppState>,
    viewer: ViewerContext,
    Path(content_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let key = WatchKey {
        account_id: viewer.account_id,
        profile_id: viewer.profile_id,
        content_id,
    };
    let existed = state.watch.delete(&key).await?;

    tracing::info!(
        account_id = %viewer.account_id,
        profile_id = %viewer.profile_id,
        content_id = %content_id,
        existed,
        "Watch record deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
