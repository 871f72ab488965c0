use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ContentKind, Device, EpisodeRef, WatchKey, WatchRecord};

use super::WatchStore;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

const RECORD_COLUMNS: &str = "id, account_id, profile_id, content_id, content_kind, \
     watched_duration, total_duration, season_number, episode_number, episode_id, \
     episode_progress, completed, last_watched_at, watch_count, device";

/// Watch record store backed by the `watch_records` table.
///
/// The unique viewer/content index carries the identity invariant; the
/// upsert replaces the row wholesale, so racing reports for one key settle
/// on whichever write commits last.
pub struct PgWatchStore {
    pool: PgPool,
}

impl PgWatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> AppResult<WatchRecord> {
    let kind: String = row.try_get("content_kind")?;
    let kind = ContentKind::parse(&kind)
        .ok_or_else(|| AppError::Internal(format!("Unknown content kind in store: {}", kind)))?;

    let device: String = row.try_get("device")?;
    let device = Device::parse(&device)
        .ok_or_else(|| AppError::Internal(format!("Unknown device in store: {}", device)))?;

    let season_number: Option<i32> = row.try_get("season_number")?;
    let episode_number: Option<i32> = row.try_get("episode_number")?;
    let current_episode = match (season_number, episode_number) {
        (Some(season), Some(episode)) => Some(EpisodeRef {
            season_number: season as u32,
            episode_number: episode as u32,
            episode_id: row.try_get("episode_id")?,
        }),
        _ => None,
    };

    let watch_count: i64 = row.try_get("watch_count")?;

    Ok(WatchRecord {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        profile_id: row.try_get("profile_id")?,
        content_id: row.try_get("content_id")?,
        content_kind: kind,
        watched_duration: row.try_get("watched_duration")?,
        total_duration: row.try_get("total_duration")?,
        current_episode,
        episode_progress: row.try_get("episode_progress")?,
        completed: row.try_get("completed")?,
        last_watched_at: row.try_get("last_watched_at")?,
        watch_count: watch_count as u64,
        device,
    })
}

#[async_trait]
impl WatchStore for PgWatchStore {
    async fn find(&self, key: &WatchKey) -> AppResult<Option<WatchRecord>> {
        let query = format!(
            "SELECT {} FROM watch_records \
             WHERE account_id = $1 AND profile_id = $2 AND content_id = $3",
            RECORD_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(key.account_id)
            .bind(key.profile_id)
            .bind(key.content_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn upsert(&self, record: WatchRecord) -> AppResult<WatchRecord> {
        // content_kind is fixed at creation and deliberately absent from
        // the conflict update list.
        sqlx::query(
            "INSERT INTO watch_records (id, account_id, profile_id, content_id, content_kind, \
             watched_duration, total_duration, season_number, episode_number, episode_id, \
             episode_progress, completed, last_watched_at, watch_count, device) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             ON CONFLICT (account_id, profile_id, content_id) DO UPDATE SET \
             watched_duration = EXCLUDED.watched_duration, \
             total_duration = EXCLUDED.total_duration, \
             season_number = EXCLUDED.season_number, \
             episode_number = EXCLUDED.episode_number, \
             episode_id = EXCLUDED.episode_id, \
             episode_progress = EXCLUDED.episode_progress, \
             completed = EXCLUDED.completed, \
             last_watched_at = EXCLUDED.last_watched_at, \
             watch_count = EXCLUDED.watch_count, \
             device = EXCLUDED.device",
        )
        .bind(record.id)
        .bind(record.account_id)
        .bind(record.profile_id)
        .bind(record.content_id)
        .bind(record.content_kind.as_str())
        .bind(record.watched_duration)
        .bind(record.total_duration)
        .bind(record.current_episode.map(|ep| ep.season_number as i32))
        .bind(record.current_episode.map(|ep| ep.episode_number as i32))
        .bind(record.current_episode.and_then(|ep| ep.episode_id))
        .bind(record.episode_progress)
        .bind(record.completed)
        .bind(record.last_watched_at)
        .bind(record.watch_count as i64)
        .bind(record.device.as_str())
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_for_viewer(
        &self,
        account_id: Uuid,
        profile_id: Uuid,
    ) -> AppResult<Vec<WatchRecord>> {
        let query = format!(
            "SELECT {} FROM watch_records WHERE account_id = $1 AND profile_id = $2",
            RECORD_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(account_id)
            .bind(profile_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn list_recent(
        &self,
        account_id: Uuid,
        profile_id: Uuid,
        limit: usize,
    ) -> AppResult<Vec<WatchRecord>> {
        let query = format!(
            "SELECT {} FROM watch_records WHERE account_id = $1 AND profile_id = $2 \
             ORDER BY last_watched_at DESC, id DESC LIMIT $3",
            RECORD_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(account_id)
            .bind(profile_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn page_recent(
        &self,
        account_id: Uuid,
        profile_id: Uuid,
        offset: usize,
        limit: usize,
    ) -> AppResult<(Vec<WatchRecord>, u64)> {
        let query = format!(
            "SELECT {} FROM watch_records WHERE account_id = $1 AND profile_id = $2 \
             ORDER BY last_watched_at DESC, id DESC LIMIT $3 OFFSET $4",
            RECORD_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(account_id)
            .bind(profile_id)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;
        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<AppResult<Vec<_>>>()?;

        let total_row = sqlx::query(
            "SELECT COUNT(*) AS count FROM watch_records \
             WHERE account_id = $1 AND profile_id = $2",
        )
        .bind(account_id)
        .bind(profile_id)
        .fetch_one(&self.pool)
        .await?;
        let total: i64 = total_row.try_get("count")?;

        Ok((records, total as u64))
    }

    async fn delete(&self, key: &WatchKey) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM watch_records \
             WHERE account_id = $1 AND profile_id = $2 AND content_id = $3",
        )
        .bind(key.account_id)
        .bind(key.profile_id)
        .bind(key.content_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_content(&self, content_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM watch_records WHERE content_id = $1")
            .bind(content_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
