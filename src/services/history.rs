use serde::{Deserialize, Serialize};

use crate::context::ViewerContext;
use crate::db::{CatalogStore, WatchStore};
use crate::error::AppResult;
use crate::models::WatchRecord;

use super::CatalogSummary;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One history row: the stored record plus live catalog metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub record: WatchRecord,
    pub content: CatalogSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub pagination: Pagination,
}

/// One newest-first page of a viewer's watch history joined with catalog
/// metadata. Records whose catalog item is missing or inactive drop out of
/// the page; `total` counts the viewer's stored records so page math stays
/// consistent with the offsets used to fetch them.
pub async fn watch_history(
    watch: &dyn WatchStore,
    catalog: &dyn CatalogStore,
    viewer: &ViewerContext,
    page: usize,
    page_size: usize,
) -> AppResult<HistoryPage> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let offset = (page - 1) * page_size;

    let (records, total) = watch
        .page_recent(viewer.account_id, viewer.profile_id, offset, page_size)
        .await?;

    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let Some(content) = catalog.get(record.content_id).await? else {
            continue;
        };
        if !content.is_active {
            continue;
        }
        entries.push(HistoryEntry {
            content: CatalogSummary::from(&content),
            record,
        });
    }

    let pages = total.div_ceil(page_size as u64).max(1);
    Ok(HistoryPage {
        entries,
        pagination: Pagination {
            page: page as u64,
            page_size: page_size as u64,
            total,
            pages,
        },
    })
}
