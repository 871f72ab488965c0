use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{ContentItem, Profile, WatchKey, WatchRecord};

pub mod cache;
pub mod memory;
pub mod postgres;

pub use cache::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use memory::{MemoryCatalog, MemoryProfileStore, MemoryWatchStore};
pub use postgres::{create_pool, PgWatchStore};

/// Durable store for per-viewer watch state.
///
/// The unique (account, profile, content) key is the only concurrency
/// control: concurrent reports for one key are read-modify-write races and
/// the last `upsert` to land wins. Implementations wanting stricter
/// semantics (compare-and-swap, retries) plug in behind this trait without
/// the services changing.
#[async_trait]
pub trait WatchStore: Send + Sync {
    async fn find(&self, key: &WatchKey) -> AppResult<Option<WatchRecord>>;

    /// Inserts or replaces the record for its key. Last write wins.
    async fn upsert(&self, record: WatchRecord) -> AppResult<WatchRecord>;

    /// Every record for a viewer, unordered.
    async fn list_for_viewer(
        &self,
        account_id: Uuid,
        profile_id: Uuid,
    ) -> AppResult<Vec<WatchRecord>>;

    /// The viewer's most recently watched records, newest first,
    /// ties broken by record id for a stable order.
    async fn list_recent(
        &self,
        account_id: Uuid,
        profile_id: Uuid,
        limit: usize,
    ) -> AppResult<Vec<WatchRecord>>;

    /// One page of the viewer's records, newest first, plus the total
    /// record count for the viewer.
    async fn page_recent(
        &self,
        account_id: Uuid,
        profile_id: Uuid,
        offset: usize,
        limit: usize,
    ) -> AppResult<(Vec<WatchRecord>, u64)>;

    /// Removes one record. Returns whether a record existed.
    async fn delete(&self, key: &WatchKey) -> AppResult<bool>;

    /// Cascade for catalog removal: purges every record tracking the
    /// content id, across all accounts. Returns the number removed.
    async fn purge_content(&self, content_id: Uuid) -> AppResult<u64>;
}

/// Read side of the externally-owned content catalog, plus the one
/// mutation this service performs: the view-count bump on completion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get(&self, content_id: Uuid) -> AppResult<Option<ContentItem>>;

    async fn increment_view_count(&self, content_id: Uuid) -> AppResult<()>;

    /// Active catalog items, the candidate pool for recommendations.
    async fn list_active(&self) -> AppResult<Vec<ContentItem>>;
}

/// Externally-owned account profiles: creation (with the per-account cap)
/// and the liked-content set the recommendation engine consumes.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Creates a profile, enforcing the per-account cap.
    async fn create_profile(
        &self,
        account_id: Uuid,
        name: String,
        is_kids: bool,
    ) -> AppResult<Profile>;

    async fn list_profiles(&self, account_id: Uuid) -> AppResult<Vec<Profile>>;

    async fn get_liked(&self, account_id: Uuid, profile_id: Uuid) -> AppResult<HashSet<Uuid>>;
}
