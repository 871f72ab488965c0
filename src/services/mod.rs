use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ContentItem, ContentKind, Rating};

pub mod continue_watching;
pub mod history;
pub mod progress;
pub mod recommendations;
pub mod stats;

pub use continue_watching::{continue_watching, ContinueWatchingEntry, DEFAULT_SHELF_LIMIT};
pub use history::{watch_history, HistoryEntry, HistoryPage, Pagination};
pub use progress::{record_progress, ProgressReport};
pub use recommendations::{recommendations, DEFAULT_RECOMMENDATION_LIMIT};
pub use stats::{watch_stats, WatchStats, DEFAULT_STATS_WINDOW_DAYS};

/// Catalog metadata projected into viewer-facing shelves and lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogSummary {
    pub content_id: Uuid,
    pub title: String,
    pub kind: ContentKind,
    pub thumbnail_url: Option<String>,
    pub release_year: Option<i32>,
    pub rating: Rating,
    pub genres: Vec<String>,
}

impl From<&ContentItem> for CatalogSummary {
    fn from(item: &ContentItem) -> Self {
        Self {
            content_id: item.id,
            title: item.title.clone(),
            kind: item.kind,
            thumbnail_url: item.display_thumbnail().map(str::to_string),
            release_year: item.release_year,
            rating: item.rating.clone(),
            genres: item.genres.clone(),
        }
    }
}
