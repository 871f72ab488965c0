use std::fmt::Display;

use redis::{AsyncCommands, Client};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Keys for cached read-model responses, namespaced per viewer.
///
/// Only the read side is ever cached; progress writes go straight to the
/// watch store and the short TTLs bound how stale a shelf can get.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Recommendations {
        account_id: Uuid,
        profile_id: Uuid,
        limit: usize,
    },
    WatchStats {
        account_id: Uuid,
        profile_id: Uuid,
        days: i64,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Recommendations {
                account_id,
                profile_id,
                limit,
            } => write!(f, "recs:{}:{}:{}", account_id, profile_id, limit),
            CacheKey::WatchStats {
                account_id,
                profile_id,
                days,
            } => write!(f, "stats:{}:{}:{}", account_id, profile_id, days),
        }
    }
}

/// Creates a Redis client for the response cache
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

enum WriterMessage {
    Put {
        key: String,
        json: String,
        ttl: u64,
    },
    Shutdown,
}

/// Read-through cache over Redis with fire-and-forget writes.
///
/// Reads hit Redis inline; writes are queued to a background task so a
/// slow cache never delays a response. The queue is drained in order, so a
/// shutdown message lets pending writes land first.
#[derive(Clone)]
pub struct Cache {
    client: Client,
    writer_tx: mpsc::UnboundedSender<WriterMessage>,
}

/// Handle for stopping the cache writer after queued writes drain
pub struct CacheWriterHandle {
    writer_tx: mpsc::UnboundedSender<WriterMessage>,
}

impl CacheWriterHandle {
    pub fn shutdown(self) {
        let _ = self.writer_tx.send(WriterMessage::Shutdown);
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    pub fn new(client: Client) -> (Self, CacheWriterHandle) {
        let (writer_tx, writer_rx) = mpsc::unbounded_channel();

        let writer_client = client.clone();
        tokio::spawn(async move {
            Self::writer_task(writer_client, writer_rx).await;
        });

        let handle = CacheWriterHandle {
            writer_tx: writer_tx.clone(),
        };
        (Self { client, writer_tx }, handle)
    }

    async fn writer_task(client: Client, mut writer_rx: mpsc::UnboundedReceiver<WriterMessage>) {
        tracing::info!("Cache writer task started");
        while let Some(message) = writer_rx.recv().await {
            match message {
                WriterMessage::Put { key, json, ttl } => {
                    if let Err(e) = Self::write(&client, &key, json, ttl).await {
                        tracing::error!(error = %e, key = %key, "Cache write failed");
                    }
                }
                WriterMessage::Shutdown => break,
            }
        }
        tracing::info!("Cache writer task stopped");
    }

    async fn write(client: &Client, key: &str, json: String, ttl: u64) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, json, ttl).await?;
        Ok(())
    }

    /// Fetches and deserializes a cached response, `None` on miss.
    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => {
                let value = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Queues a response for caching without waiting on Redis.
    pub fn put_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let message = WriterMessage::Put {
            key: key.to_string(),
            json,
            ttl,
        };
        if self.writer_tx.send(message).is_err() {
            tracing::warn!("Cache writer is gone, dropping write");
        }
    }
}
