use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ContentItem, Profile, WatchKey, WatchRecord, MAX_PROFILES_PER_ACCOUNT};

use super::{CatalogStore, ProfileStore, WatchStore};

/// In-memory watch record store keyed by the viewer/content triple.
///
/// The map key enforces the uniqueness invariant the Postgres store gets
/// from its unique index. Clones share the underlying map.
#[derive(Clone, Default)]
pub struct MemoryWatchStore {
    records: Arc<RwLock<HashMap<WatchKey, WatchRecord>>>,
}

impl MemoryWatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(a: &WatchRecord, b: &WatchRecord) -> std::cmp::Ordering {
    b.last_watched_at
        .cmp(&a.last_watched_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl WatchStore for MemoryWatchStore {
    async fn find(&self, key: &WatchKey) -> AppResult<Option<WatchRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn upsert(&self, record: WatchRecord) -> AppResult<WatchRecord> {
        self.records
            .write()
            .await
            .insert(record.key(), record.clone());
        Ok(record)
    }

    async fn list_for_viewer(
        &self,
        account_id: Uuid,
        profile_id: Uuid,
    ) -> AppResult<Vec<WatchRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.account_id == account_id && r.profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn list_recent(
        &self,
        account_id: Uuid,
        profile_id: Uuid,
        limit: usize,
    ) -> AppResult<Vec<WatchRecord>> {
        let mut records = self.list_for_viewer(account_id, profile_id).await?;
        records.sort_by(newest_first);
        records.truncate(limit);
        Ok(records)
    }

    async fn page_recent(
        &self,
        account_id: Uuid,
        profile_id: Uuid,
        offset: usize,
        limit: usize,
    ) -> AppResult<(Vec<WatchRecord>, u64)> {
        let mut records = self.list_for_viewer(account_id, profile_id).await?;
        records.sort_by(newest_first);
        let total = records.len() as u64;
        let page = records.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn delete(&self, key: &WatchKey) -> AppResult<bool> {
        Ok(self.records.write().await.remove(key).is_some())
    }

    async fn purge_content(&self, content_id: Uuid) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|key, _| key.content_id != content_id);
        Ok((before - records.len()) as u64)
    }
}

/// In-memory stand-in for the external content catalog. Used for
/// standalone runs and tests; the catalog service owns the real data.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    items: Arc<RwLock<HashMap<Uuid, ContentItem>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, item: ContentItem) {
        self.items.write().await.insert(item.id, item);
    }

    pub async fn remove(&self, content_id: Uuid) -> Option<ContentItem> {
        self.items.write().await.remove(&content_id)
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn get(&self, content_id: Uuid) -> AppResult<Option<ContentItem>> {
        Ok(self.items.read().await.get(&content_id).cloned())
    }

    async fn increment_view_count(&self, content_id: Uuid) -> AppResult<()> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(&content_id)
            .ok_or_else(|| AppError::NotFound("Content not found".to_string()))?;
        item.view_count += 1;
        Ok(())
    }

    async fn list_active(&self) -> AppResult<Vec<ContentItem>> {
        Ok(self
            .items
            .read()
            .await
            .values()
            .filter(|item| item.is_active)
            .cloned()
            .collect())
    }
}

/// In-memory profile store; profiles are their own keyed records with an
/// account reference, and the per-account cap is checked at creation.
#[derive(Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Arc<RwLock<HashMap<Uuid, Profile>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips a liked mark in place; returns the new state.
    pub async fn toggle_like(&self, profile_id: Uuid, content_id: Uuid) -> AppResult<bool> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(&profile_id)
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
        Ok(profile.toggle_like(content_id))
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn create_profile(
        &self,
        account_id: Uuid,
        name: String,
        is_kids: bool,
    ) -> AppResult<Profile> {
        let mut profiles = self.profiles.write().await;
        let existing = profiles
            .values()
            .filter(|p| p.account_id == account_id)
            .count();
        if existing >= MAX_PROFILES_PER_ACCOUNT {
            return Err(AppError::InvalidInput(format!(
                "Cannot have more than {} profiles",
                MAX_PROFILES_PER_ACCOUNT
            )));
        }

        let profile = Profile::new(account_id, name, is_kids);
        profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn list_profiles(&self, account_id: Uuid) -> AppResult<Vec<Profile>> {
        let mut profiles: Vec<Profile> = self
            .profiles
            .read()
            .await
            .values()
            .filter(|p| p.account_id == account_id)
            .cloned()
            .collect();
        profiles.sort_by_key(|p| p.created_at);
        Ok(profiles)
    }

    async fn get_liked(&self, account_id: Uuid, profile_id: Uuid) -> AppResult<HashSet<Uuid>> {
        let profiles = self.profiles.read().await;
        Ok(profiles
            .get(&profile_id)
            .filter(|p| p.account_id == account_id)
            .map(|p| p.liked_content.clone())
            .unwrap_or_default())
    }
}
