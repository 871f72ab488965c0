use std::sync::Arc;

use crate::db::{
    Cache, CatalogStore, MemoryCatalog, MemoryProfileStore, MemoryWatchStore, ProfileStore,
    WatchStore,
};

/// Shared application state: the watch store this service owns, the two
/// external collaborators behind their traits, and an optional response
/// cache.
#[derive(Clone)]
pub struct AppState {
    pub watch: Arc<dyn WatchStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub cache: Option<Cache>,
}

impl AppState {
    pub fn new(
        watch: Arc<dyn WatchStore>,
        catalog: Arc<dyn CatalogStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            watch,
            catalog,
            profiles,
            cache: None,
        }
    }

    /// State wired entirely on in-memory stores, for standalone runs and
    /// tests.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryWatchStore::new()),
            Arc::new(MemoryCatalog::new()),
            Arc::new(MemoryProfileStore::new()),
        )
    }

    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }
}
