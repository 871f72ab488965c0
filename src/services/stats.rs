use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::ViewerContext;
use crate::db::{CatalogStore, WatchStore};
use crate::error::AppResult;
use crate::models::ContentItem;

pub const DEFAULT_STATS_WINDOW_DAYS: i64 = 30;

/// Reports for one day and the watched item's leading genre
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub genre: Option<String>,
    pub count: u64,
    pub total_duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreStat {
    pub genre: String,
    pub count: u64,
    pub total_duration: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatsSummary {
    pub total_watched: u64,
    pub total_completed: u64,
    pub total_duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchStats {
    pub daily: Vec<DailyStat>,
    pub by_genre: Vec<GenreStat>,
    pub summary: StatsSummary,
}

/// Aggregates a viewer's history into the stats dashboard shape.
///
/// Three independent reductions over one record scan: a window-bound daily
/// series keyed by date and the item's first genre, a per-genre breakdown
/// over active catalog items, and an all-time summary that ignores both
/// the window and the catalog join.
pub async fn watch_stats(
    watch: &dyn WatchStore,
    catalog: &dyn CatalogStore,
    viewer: &ViewerContext,
    window_days: i64,
) -> AppResult<WatchStats> {
    let records = watch
        .list_for_viewer(viewer.account_id, viewer.profile_id)
        .await?;
    let window_start = Utc::now() - Duration::days(window_days.max(0));

    // Join each distinct content id once
    let mut content_by_id: HashMap<Uuid, Option<ContentItem>> = HashMap::new();
    for record in &records {
        if !content_by_id.contains_key(&record.content_id) {
            content_by_id.insert(record.content_id, catalog.get(record.content_id).await?);
        }
    }

    let mut daily: BTreeMap<(NaiveDate, Option<String>), (u64, f64)> = BTreeMap::new();
    let mut by_genre: HashMap<String, (u64, f64)> = HashMap::new();
    let mut summary = StatsSummary::default();

    for record in &records {
        summary.total_watched += 1;
        if record.completed {
            summary.total_completed += 1;
        }
        summary.total_duration += record.watched_duration;

        let Some(Some(content)) = content_by_id.get(&record.content_id) else {
            continue;
        };

        if record.last_watched_at >= window_start {
            let bucket = (
                record.last_watched_at.date_naive(),
                content.genres.first().cloned(),
            );
            let entry = daily.entry(bucket).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += record.watched_duration;
        }

        if content.is_active {
            for genre in &content.genres {
                let entry = by_genre.entry(genre.clone()).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += record.watched_duration;
            }
        }
    }

    let daily = daily
        .into_iter()
        .map(|((date, genre), (count, total_duration))| DailyStat {
            date,
            genre,
            count,
            total_duration,
        })
        .collect();

    let mut by_genre: Vec<GenreStat> = by_genre
        .into_iter()
        .map(|(genre, (count, total_duration))| GenreStat {
            genre,
            count,
            total_duration,
        })
        .collect();
    by_genre.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.genre.cmp(&b.genre)));

    Ok(WatchStats {
        daily,
        by_genre,
        summary,
    })
}
