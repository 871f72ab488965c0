use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::ViewerContext;
use crate::db::{CatalogStore, WatchStore};
use crate::error::AppResult;
use crate::models::{EpisodeRef, WatchRecord};

use super::CatalogSummary;

pub const DEFAULT_SHELF_LIMIT: usize = 10;

/// One shelf entry: the latest stored position for a content item,
/// joined with live catalog metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContinueWatchingEntry {
    pub content: CatalogSummary,
    pub watched_duration: f64,
    pub total_duration: f64,
    pub current_episode: Option<EpisodeRef>,
    pub completed: bool,
    pub last_watched_at: DateTime<Utc>,
}

/// True when `candidate` should replace `incumbent` as a content item's
/// surviving record. Ties on the timestamp break by record id so the
/// outcome is deterministic.
fn supersedes(candidate: &WatchRecord, incumbent: &WatchRecord) -> bool {
    match candidate.last_watched_at.cmp(&incumbent.last_watched_at) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => candidate.id > incumbent.id,
    }
}

/// Rebuilds the continue-watching shelf from the viewer's event history.
///
/// The raw history may hold stale entries per content item (duplicate-key
/// drift); the shelf keeps only the freshest position for each, joined
/// against the live catalog. Items that have gone missing or inactive are
/// dropped. A record's own `completed` flag is not a filter: a finished
/// episode is exactly what "continue watching the next episode" surfaces.
pub async fn continue_watching(
    watch: &dyn WatchStore,
    catalog: &dyn CatalogStore,
    viewer: &ViewerContext,
    limit: usize,
) -> AppResult<Vec<ContinueWatchingEntry>> {
    let limit = limit.max(1);

    let records = watch
        .list_for_viewer(viewer.account_id, viewer.profile_id)
        .await?;

    // Group by content, keep the latest record per item
    let mut latest: HashMap<Uuid, WatchRecord> = HashMap::new();
    for record in records {
        match latest.entry(record.content_id) {
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                if supersedes(&record, entry.get()) {
                    entry.insert(record);
                }
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(record);
            }
        }
    }

    // Join each surviving record with its catalog item
    let mut entries = Vec::with_capacity(latest.len());
    for record in latest.into_values() {
        let Some(content) = catalog.get(record.content_id).await? else {
            continue;
        };
        if !content.is_active {
            continue;
        }

        entries.push(ContinueWatchingEntry {
            content: CatalogSummary::from(&content),
            watched_duration: record.watched_duration,
            total_duration: record.total_duration,
            current_episode: record.current_episode,
            completed: record.completed,
            last_watched_at: record.last_watched_at,
        });
    }

    entries.sort_by(|a, b| {
        b.last_watched_at
            .cmp(&a.last_watched_at)
            .then_with(|| b.content.content_id.cmp(&a.content.content_id))
    });
    entries.truncate(limit);

    Ok(entries)
}
