use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use playhead_api::config::Config;
use playhead_api::db::{self, Cache};
use playhead_api::routes::create_router;
use playhead_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("playhead_api=debug,tower_http=info")),
        )
        .init();

    // Watch records go to Postgres when configured; catalog and profiles
    // are external collaborators and run on the in-memory stand-ins here.
    let state = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = db::create_pool(database_url).await?;
            sqlx::migrate!().run(&pool).await?;
            tracing::info!("Watch records backed by PostgreSQL");
            AppState::new(
                Arc::new(db::PgWatchStore::new(pool)),
                Arc::new(db::MemoryCatalog::new()),
                Arc::new(db::MemoryProfileStore::new()),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set, watch records are in-memory only");
            AppState::in_memory()
        }
    };

    let (state, _cache_writer) = match config.redis_url.as_deref() {
        Some(redis_url) => {
            let client = db::create_redis_client(redis_url)?;
            let (cache, writer) = Cache::new(client);
            tracing::info!("Response cache enabled");
            (state.with_cache(cache), Some(writer))
        }
        None => (state, None),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(host = %config.host, port = config.port, "playhead-api listening");
    axum::serve(listener, app).await?;

    Ok(())
}
